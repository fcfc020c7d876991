//! Route extraction from Python function declarations.
//!
//! This module holds the metadata model shared by extraction and rendering
//! ([`Endpoint`], [`HttpMethod`], [`Metadata`]) and the [`RouteExtractor`]
//! seam. The only implementation today is [`fastapi::FastApiExtractor`],
//! which recognises `@<receiver>.<verb>(...)` decorators.
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_python::extractor::{extract_metadata, ExtractorConfig};
//!
//! let source = "@app.get('/users')\ndef list_users():\n    pass\n";
//! let metadata = extract_metadata(source, &ExtractorConfig::default()).unwrap();
//! println!("Found {} endpoints", metadata.endpoints.len());
//! ```

pub mod fastapi;

use crate::error::Result;
use crate::parser::{ParsedFile, PythonParser};
use crate::walker::{self, Decorator, FunctionDecl};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Trait for turning walked function declarations into endpoints.
pub trait RouteExtractor {
    /// Extracts endpoints from function declarations, in the order given.
    ///
    /// Declarations that carry no qualifying decorator contribute nothing;
    /// rejection is silent.
    fn extract_routes(&self, functions: &[FunctionDecl]) -> Vec<Endpoint>;
}

/// One recovered `(path, method, parameters)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Route path template, never empty (e.g. "/items")
    pub path: String,
    pub method: HttpMethod,
    /// Parameter names in declaration order, duplicates preserved
    pub parameters: Vec<String>,
}

impl Endpoint {
    pub fn new(path: String, method: HttpMethod, parameters: Vec<String>) -> Self {
        Self {
            path,
            method,
            parameters,
        }
    }
}

/// The closed set of recognised HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Matches a decorator attribute name, ignoring case.
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Upper-case wire name, e.g. "GET"
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Lower-case name used as the operation key in an OpenAPI path item
    pub fn operation_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoints recovered from one request's worth of source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub endpoints: Vec<Endpoint>,
}

/// Which positional parameter names make it into an [`Endpoint`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterPolicy {
    /// Drop names beginning with `__`
    #[default]
    ExcludeDunder,
    IncludeAll,
}

impl ParameterPolicy {
    pub fn admits(&self, name: &str) -> bool {
        match self {
            ParameterPolicy::ExcludeDunder => !name.starts_with("__"),
            ParameterPolicy::IncludeAll => true,
        }
    }
}

/// Progress notifications emitted while extracting.
#[derive(Debug)]
pub enum TraceEvent<'a> {
    Function(&'a FunctionDecl),
    Decorator {
        function: &'a str,
        decorator: &'a Decorator,
    },
    Endpoint(&'a Endpoint),
    Rejected {
        function: &'a str,
        reason: RejectReason,
    },
}

/// Why a decorator did not produce an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotACall,
    NotAnAttributeCallee,
    UnknownMethod(String),
    NoLiteralPath,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotACall => write!(f, "decorator is not a call"),
            RejectReason::NotAnAttributeCallee => write!(f, "callee is not an attribute access"),
            RejectReason::UnknownMethod(name) => write!(f, "`{}` is not an HTTP method", name),
            RejectReason::NoLiteralPath => write!(f, "no literal path argument"),
        }
    }
}

/// Callback receiving [`TraceEvent`]s.
pub type TraceHook = Arc<dyn Fn(&TraceEvent<'_>) + Send + Sync>;

/// Extraction settings.
#[derive(Clone, Default)]
pub struct ExtractorConfig {
    pub parameter_policy: ParameterPolicy,
    /// Optional observer; extraction is silent without one
    pub trace: Option<TraceHook>,
}

impl ExtractorConfig {
    pub fn with_parameter_policy(mut self, policy: ParameterPolicy) -> Self {
        self.parameter_policy = policy;
        self
    }

    pub fn with_trace<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TraceEvent<'_>) + Send + Sync + 'static,
    {
        self.trace = Some(Arc::new(hook));
        self
    }

    pub(crate) fn emit(&self, event: TraceEvent<'_>) {
        if let Some(hook) = &self.trace {
            hook(&event);
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("parameter_policy", &self.parameter_policy)
            .field("trace", &self.trace.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

/// Parses source text and extracts its endpoints.
///
/// Extraction is all-or-nothing: if the source does not parse, the whole
/// call fails with [`crate::error::Error::SyntaxFailure`] and no partial
/// endpoint list is returned.
pub fn extract_metadata(source: &str, config: &ExtractorConfig) -> Result<Metadata> {
    let parsed = PythonParser::parse_source(source)?;
    extract_from_files(std::slice::from_ref(&parsed), config)
}

/// Extracts endpoints from several parsed files, concatenated in file order.
pub fn extract_from_files(parsed_files: &[ParsedFile], config: &ExtractorConfig) -> Result<Metadata> {
    let extractor = fastapi::FastApiExtractor::new(config.clone());
    let mut endpoints = Vec::new();

    for parsed in parsed_files {
        let functions = walker::walk(parsed)?;
        let found = extractor.extract_routes(&functions);
        debug!(
            "Extracted {} endpoints from {}",
            found.len(),
            parsed.path.display()
        );
        endpoints.extend(found);
    }

    Ok(Metadata { endpoints })
}

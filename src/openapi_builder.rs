use crate::extractor::{Endpoint, HttpMethod, Metadata};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

/// Version written to the `openapi` field of every document.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// OpenAPI document builder
///
/// Paths and operations are kept in insertion order so that the rendered
/// document lists endpoints exactly in discovery order and is byte-identical
/// across runs.
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Paths collection (URL path -> PathItem)
    paths: IndexMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object: operations for a single path keyed by the
/// lower-case method name
pub type PathItem = IndexMap<String, Operation>;

/// OpenAPI Operation object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation summary
    pub summary: String,
    /// Query parameters, one per recovered parameter name
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code
    pub responses: IndexMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: Schema,
}

/// Minimal schema object; types are never inferred, so this is always
/// `{"type": "string"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: String,
}

impl Schema {
    pub fn string() -> Self {
        Self {
            schema_type: "string".to_string(),
        }
    }
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "AutoDocGen API".to_string(),
                version: "1.0".to_string(),
                description: None,
            },
            paths: IndexMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Add an endpoint to the document.
    ///
    /// A second method on an existing path is appended to that path's item;
    /// repeating a (path, method) pair replaces the earlier operation in place.
    pub fn add_endpoint(&mut self, endpoint: &Endpoint) {
        debug!("Adding endpoint: {} {}", endpoint.method, endpoint.path);

        let parameters = endpoint
            .parameters
            .iter()
            .map(|name| Parameter {
                name: name.clone(),
                location: "query".to_string(),
                required: false,
                schema: Schema::string(),
            })
            .collect();

        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: success_description(endpoint.method).to_string(),
            },
        );

        let operation = Operation {
            summary: format!("{} endpoint for {}", endpoint.method, endpoint.path),
            parameters,
            responses,
        };

        self.paths
            .entry(endpoint.path.clone())
            .or_default()
            .insert(endpoint.method.operation_key().to_string(), operation);
    }

    /// Add every endpoint of `metadata`, in order
    pub fn add_metadata(&mut self, metadata: &Metadata) {
        for endpoint in &metadata.endpoints {
            self.add_endpoint(endpoint);
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document with {} paths", self.paths.len());
        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            paths: self.paths,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn success_description(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Post => "Created",
        _ => "Success",
    }
}

//! End-to-end documentation pipeline.
//!
//! [`DocGenerator`] runs extraction once and feeds the resulting
//! [`Metadata`] to both renderers. It owns no state besides its
//! configuration, so a single generator can serve concurrent requests.

use crate::error::{ErrorReport, Result};
use crate::extractor::{self, ExtractorConfig, Metadata};
use crate::markdown::{self, MarkdownBuilder};
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::parser::ParsedFile;
use crate::serializer::serialize_json;
use log::{debug, warn};
use serde::Serialize;

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub extractor: ExtractorConfig,
    /// `info.title` of the OpenAPI document
    pub title: String,
    /// `info.version` of the OpenAPI document
    pub version: String,
    pub description: Option<String>,
    /// Top-level heading of the Markdown document
    pub narrative_title: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            title: "AutoDocGen API".to_string(),
            version: "1.0".to_string(),
            description: None,
            narrative_title: markdown::DEFAULT_TITLE.to_string(),
        }
    }
}

/// Both documents rendered from one [`Metadata`].
#[derive(Debug, Clone)]
pub struct GeneratedDocs {
    pub metadata: Metadata,
    pub openapi: OpenApiDocument,
    /// `openapi` serialized as pretty JSON
    pub openapi_json: String,
    pub markdown: String,
}

/// Response envelope handed back to callers of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocResponse {
    Generated {
        message: String,
        openapi_json: String,
        markdown_docs: String,
    },
    Failed(ErrorReport),
}

pub struct DocGenerator {
    config: GeneratorConfig,
}

impl DocGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Extracts endpoints from `source` and renders both documents.
    pub fn generate(&self, source: &str) -> Result<GeneratedDocs> {
        let metadata = extractor::extract_metadata(source, &self.config.extractor)?;
        self.render(metadata)
    }

    /// Same as [`generate`](Self::generate) for several already-parsed files.
    pub fn generate_from_files(&self, parsed_files: &[ParsedFile]) -> Result<GeneratedDocs> {
        let metadata = extractor::extract_from_files(parsed_files, &self.config.extractor)?;
        self.render(metadata)
    }

    /// Renders both documents from existing metadata.
    pub fn render(&self, metadata: Metadata) -> Result<GeneratedDocs> {
        if metadata.endpoints.is_empty() {
            warn!("No endpoints found; rendering empty documents");
        }

        let mut builder = OpenApiBuilder::new().with_info(
            self.config.title.clone(),
            self.config.version.clone(),
            self.config.description.clone(),
        );
        builder.add_metadata(&metadata);
        let openapi = builder.build();
        let openapi_json = serialize_json(&openapi)?;

        let markdown = MarkdownBuilder::new()
            .with_title(self.config.narrative_title.clone())
            .render(&metadata);

        debug!(
            "Rendered {} endpoints ({} bytes JSON, {} bytes Markdown)",
            metadata.endpoints.len(),
            openapi_json.len(),
            markdown.len()
        );

        Ok(GeneratedDocs {
            metadata,
            openapi,
            openapi_json,
            markdown,
        })
    }

    /// Runs the pipeline and wraps the outcome in a [`DocResponse`].
    pub fn respond(&self, source: &str) -> DocResponse {
        match self.generate(source) {
            Ok(docs) => DocResponse::Generated {
                message: "Documentation generated".to_string(),
                openapi_json: docs.openapi_json,
                markdown_docs: docs.markdown,
            },
            Err(e) => {
                warn!("Documentation generation failed: {}", e);
                DocResponse::Failed(ErrorReport::from(&e))
            }
        }
    }
}

impl Default for DocGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::HttpMethod;

    const SAMPLE: &str = r#"
from fastapi import FastAPI

app = FastAPI()

@app.get("/users")
async def list_users():
    return {"users": []}

@app.post("/items")
async def create_item(item_id: int):
    return {"item_id": item_id}
"#;

    #[test]
    fn test_generate_sample() {
        let docs = DocGenerator::default().generate(SAMPLE).unwrap();

        assert_eq!(docs.metadata.endpoints.len(), 2);
        assert_eq!(docs.metadata.endpoints[1].method, HttpMethod::Post);
        assert_eq!(
            docs.openapi.paths["/items"]["post"].responses["200"].description,
            "Created"
        );
        assert!(docs.markdown.contains("Parameters: item_id"));
        assert!(docs.markdown.contains("Parameters: None"));
    }

    #[test]
    fn test_documents_share_endpoint_order() {
        let docs = DocGenerator::default().generate(SAMPLE).unwrap();

        let schema_order: Vec<_> = docs.openapi.paths.keys().cloned().collect();
        let narrative_order: Vec<_> = docs
            .markdown
            .lines()
            .filter_map(|l| l.strip_prefix("## "))
            .map(|l| l.split_once(' ').map(|(_, p)| p.to_string()).unwrap_or_default())
            .collect();
        assert_eq!(schema_order, narrative_order);
    }

    #[test]
    fn test_generate_is_idempotent() {
        let generator = DocGenerator::default();
        let first = generator.generate(SAMPLE).unwrap();
        let second = generator.generate(SAMPLE).unwrap();
        assert_eq!(first.openapi_json, second.openapi_json);
        assert_eq!(first.markdown, second.markdown);
    }

    #[test]
    fn test_custom_info() {
        let config = GeneratorConfig {
            title: "Shop".to_string(),
            version: "2.1".to_string(),
            description: Some("Shop endpoints".to_string()),
            narrative_title: "Shop Reference".to_string(),
            ..GeneratorConfig::default()
        };
        let docs = DocGenerator::new(config).generate(SAMPLE).unwrap();
        assert_eq!(docs.openapi.info.title, "Shop");
        assert_eq!(docs.openapi.info.description.as_deref(), Some("Shop endpoints"));
        assert!(docs.markdown.starts_with("# Shop Reference\n"));
    }

    #[test]
    fn test_respond_success_envelope() {
        let response = DocGenerator::default().respond(SAMPLE);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["message"], "Documentation generated");
        assert!(value["openapi_json"].as_str().unwrap().contains("\"/users\""));
        assert!(value["markdown_docs"].as_str().unwrap().contains("## GET /users"));
    }

    #[test]
    fn test_respond_error_envelope() {
        let response = DocGenerator::default().respond("def broken(:\n");
        let value = serde_json::to_value(&response).unwrap();
        let error = value["error"].as_str().unwrap();
        assert!(error.starts_with("Parsing failed: "));
        assert!(value.get("openapi_json").is_none());
    }
}

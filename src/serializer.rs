//! Serialization of OpenAPI documents to JSON or YAML, and file output.

use crate::error::Result;
use crate::openapi_builder::OpenApiDocument;
use anyhow::Context;
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to pretty-printed JSON.
///
/// Keys appear in insertion order with two-space indentation, so the same
/// document always serializes to the same bytes.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Serializes an OpenAPI document to YAML.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Writes string content to a file, creating parent directories as needed.
///
/// Existing files are overwritten.
pub fn write_to_file(content: &str, path: &Path) -> anyhow::Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Endpoint, HttpMethod};
    use crate::openapi_builder::OpenApiBuilder;
    use tempfile::TempDir;

    fn create_test_document() -> OpenApiDocument {
        let mut builder = OpenApiBuilder::new();
        builder.add_endpoint(&Endpoint::new(
            "/users".to_string(),
            HttpMethod::Get,
            vec!["limit".to_string()],
        ));
        builder.build()
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["openapi"], "3.0.0");
        assert_eq!(parsed["info"]["title"], "AutoDocGen API");
        assert_eq!(
            parsed["paths"]["/users"]["get"]["parameters"][0]["in"],
            "query"
        );
        assert!(json.contains("\n  \"info\""), "expected two-space indentation");
    }

    #[test]
    fn test_serialize_json_is_deterministic() {
        let doc = create_test_document();
        assert_eq!(serialize_json(&doc).unwrap(), serialize_json(&doc).unwrap());
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("openapi: 3.0.0") || yaml.contains("openapi: '3.0.0'"));
        assert!(yaml.contains("paths:"));
        assert!(yaml.contains("/users:"));
        assert!(yaml.contains("get:"));

        let parsed: OpenApiDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, create_test_document());
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("out").join("nested").join("openapi.json");

        write_to_file("{}", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("docs.md");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }
}

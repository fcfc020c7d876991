//! Markdown reference document rendered from extracted metadata.
//!
//! Each endpoint gets one section, in the same order the OpenAPI builder
//! uses, so the two documents describe the same [`Metadata`] identically:
//!
//! ```text
//! # API Documentation
//!
//! ## POST /items
//! - Description: POST endpoint for /items
//! - Parameters: item_id
//! - Responses: 200 Created
//! ```

use crate::extractor::{Endpoint, HttpMethod, Metadata};
use log::debug;

pub const DEFAULT_TITLE: &str = "API Documentation";

/// Markdown renderer
pub struct MarkdownBuilder {
    title: String,
}

impl MarkdownBuilder {
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Set the top-level heading
    pub fn with_title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    /// Render the document. Empty metadata yields just the heading.
    pub fn render(&self, metadata: &Metadata) -> String {
        debug!("Rendering Markdown for {} endpoints", metadata.endpoints.len());

        let mut out = format!("# {}\n", self.title);
        for endpoint in &metadata.endpoints {
            out.push('\n');
            render_section(&mut out, endpoint);
        }
        out
    }
}

impl Default for MarkdownBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn render_section(out: &mut String, endpoint: &Endpoint) {
    let parameters = if endpoint.parameters.is_empty() {
        "None".to_string()
    } else {
        endpoint.parameters.join(", ")
    };

    out.push_str(&format!("## {} {}\n", endpoint.method, endpoint.path));
    out.push_str(&format!(
        "- Description: {} endpoint for {}\n",
        endpoint.method, endpoint.path
    ));
    out.push_str(&format!("- Parameters: {}\n", parameters));
    out.push_str(&format!(
        "- Responses: 200 {}\n",
        response_wording(endpoint.method)
    ));
}

fn response_wording(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Post => "Created",
        _ => "OK",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Metadata {
        Metadata {
            endpoints: vec![
                Endpoint::new("/users".to_string(), HttpMethod::Get, vec![]),
                Endpoint::new(
                    "/items".to_string(),
                    HttpMethod::Post,
                    vec!["item_id".to_string(), "q".to_string()],
                ),
            ],
        }
    }

    #[test]
    fn test_render_sections_in_order() {
        let doc = MarkdownBuilder::new().render(&sample());
        let expected = "\
# API Documentation

## GET /users
- Description: GET endpoint for /users
- Parameters: None
- Responses: 200 OK

## POST /items
- Description: POST endpoint for /items
- Parameters: item_id, q
- Responses: 200 Created
";
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_empty_metadata_renders_heading_only() {
        let doc = MarkdownBuilder::new().render(&Metadata::default());
        assert_eq!(doc, "# API Documentation\n");
    }

    #[test]
    fn test_custom_title() {
        let doc = MarkdownBuilder::new()
            .with_title("Shop API".to_string())
            .render(&Metadata::default());
        assert_eq!(doc, "# Shop API\n");
    }

    #[test]
    fn test_put_and_delete_are_ok() {
        let metadata = Metadata {
            endpoints: vec![
                Endpoint::new("/a".to_string(), HttpMethod::Put, vec![]),
                Endpoint::new("/a".to_string(), HttpMethod::Delete, vec![]),
            ],
        };
        let doc = MarkdownBuilder::new().render(&metadata);
        assert_eq!(doc.matches("- Responses: 200 OK").count(), 2);
    }

    #[test]
    fn test_duplicate_parameters_are_listed() {
        let metadata = Metadata {
            endpoints: vec![Endpoint::new(
                "/a".to_string(),
                HttpMethod::Get,
                vec!["x".to_string(), "x".to_string()],
            )],
        };
        let doc = MarkdownBuilder::new().render(&metadata);
        assert!(doc.contains("- Parameters: x, x\n"));
    }
}

//! OpenAPI from Python - documentation generated from route decorators.
//!
//! This library statically analyzes Python source of web applications written in the
//! FastAPI style (`@app.get("/users")`, `@router.post(path="/items")`) and renders the
//! recovered routes as an OpenAPI 3.0 document and as a Markdown reference. The analyzed
//! code is never executed, imported or type-checked; only literal route paths are
//! recovered.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively scans directories for Python files
//! 2. [`parser`] - Parses Python source into a tree-sitter syntax tree
//! 3. [`walker`] - Flattens the tree into function declarations with their decorators
//! 4. [`extractor`] - Matches route decorators and builds the endpoint [`extractor::Metadata`]
//! 5. [`openapi_builder`] - Renders the OpenAPI document
//! 6. [`markdown`] - Renders the Markdown reference
//! 7. [`serializer`] - Serializes the OpenAPI document to JSON or YAML
//! 8. [`generator`] - Runs steps 2 to 7 for one request
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_python::generator::DocGenerator;
//!
//! let source = r#"
//! @app.get("/users")
//! async def list_users():
//!     return []
//! "#;
//!
//! let docs = DocGenerator::default().generate(source).unwrap();
//! println!("{}", docs.openapi_json);
//! println!("{}", docs.markdown);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod scanner;
pub mod parser;
pub mod walker;
pub mod extractor;
pub mod openapi_builder;
pub mod markdown;
pub mod serializer;
pub mod generator;
pub mod error;

use crate::error::ErrorReport;
use crate::extractor::{ExtractorConfig, ParameterPolicy};
use crate::generator::{DocGenerator, DocResponse, GeneratorConfig};
use crate::parser::{ParsedFile, PythonParser};
use crate::scanner::FileScanner;
use crate::serializer::{serialize_yaml, write_to_file};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Generate OpenAPI and Markdown documentation from the route decorators of a Python web app
#[derive(Parser, Debug)]
#[command(name = "openapi-from-python")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Python file or directory to analyze
    #[arg(value_name = "SOURCE_PATH")]
    pub source_path: PathBuf,

    /// Directory that receives the generated documents
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Format of the OpenAPI document
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Title written to the OpenAPI `info` section
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Version written to the OpenAPI `info` section
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Description written to the OpenAPI `info` section
    #[arg(long = "description")]
    pub description: Option<String>,

    /// Keep parameters whose names start with `__`
    #[arg(long = "include-dunder")]
    pub include_dunder: bool,

    /// Print the JSON response envelope to stdout
    #[arg(long = "print")]
    pub print: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "openapi.json",
            OutputFormat::Yaml => "openapi.yaml",
        }
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source_path.exists() {
        anyhow::bail!("Source path does not exist: {}", args.source_path.display());
    }

    info!("Source path: {}", args.source_path.display());
    info!("Output directory: {}", args.output_dir.display());
    info!("Output format: {:?}", args.output_format);

    Ok(args)
}

impl CliArgs {
    fn generator_config(&self) -> GeneratorConfig {
        let policy = if self.include_dunder {
            ParameterPolicy::IncludeAll
        } else {
            ParameterPolicy::ExcludeDunder
        };
        let defaults = GeneratorConfig::default();

        GeneratorConfig {
            extractor: ExtractorConfig::default().with_parameter_policy(policy),
            title: self.title.clone().unwrap_or(defaults.title),
            version: self.api_version.clone().unwrap_or(defaults.version),
            description: self.description.clone(),
            narrative_title: defaults.narrative_title,
        }
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting documentation generation...");

    // Step 1: Find Python files
    let scan_result = FileScanner::new(args.source_path.clone()).scan()?;
    for warning in &scan_result.warnings {
        log::warn!("{}", warning);
    }
    info!("Found {} Python files", scan_result.python_files.len());

    if scan_result.python_files.is_empty() {
        anyhow::bail!("No Python files found at {}", args.source_path.display());
    }

    // Step 2: Parse; any failure aborts the whole run
    let generator = DocGenerator::new(args.generator_config());
    let outcome = PythonParser::parse_files(&scan_result.python_files)
        .into_iter()
        .collect::<crate::error::Result<Vec<ParsedFile>>>()
        .and_then(|parsed| generator.generate_from_files(&parsed));

    let docs = match outcome {
        Ok(docs) => docs,
        Err(e) => {
            if args.print {
                let report = DocResponse::Failed(ErrorReport::from(&e));
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            return Err(e.into());
        }
    };
    info!("Extracted {} endpoints", docs.metadata.endpoints.len());

    // Step 3: Write both documents
    let schema = match args.output_format {
        OutputFormat::Json => docs.openapi_json.clone(),
        OutputFormat::Yaml => serialize_yaml(&docs.openapi)?,
    };
    let schema_path = args.output_dir.join(args.output_format.file_name());
    let markdown_path = args.output_dir.join("docs.md");

    write_to_file(&schema, &schema_path)?;
    info!("Wrote {}", schema_path.display());
    write_to_file(&docs.markdown, &markdown_path)?;
    info!("Wrote {}", markdown_path.display());

    if args.print {
        let response = DocResponse::Generated {
            message: "Documentation generated".to_string(),
            openapi_json: docs.openapi_json,
            markdown_docs: docs.markdown,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    info!("Generation complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(source: PathBuf, output_dir: PathBuf) -> CliArgs {
        CliArgs {
            source_path: source,
            output_dir,
            output_format: OutputFormat::Json,
            title: None,
            api_version: None,
            description: None,
            include_dunder: false,
            print: false,
            verbose: false,
        }
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "openapi-from-python",
            "app.py",
            "-f",
            "yaml",
            "-o",
            "docs",
            "--title",
            "Shop",
            "--include-dunder",
        ])
        .unwrap();

        assert_eq!(args.source_path, PathBuf::from("app.py"));
        assert_eq!(args.output_format, OutputFormat::Yaml);
        assert_eq!(args.output_dir, PathBuf::from("docs"));
        assert_eq!(args.title.as_deref(), Some("Shop"));
        assert!(args.include_dunder);
    }

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::try_parse_from(["openapi-from-python", "app.py"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert_eq!(args.output_format, OutputFormat::Json);

        let config = args.generator_config();
        assert_eq!(config.title, "AutoDocGen API");
        assert_eq!(config.extractor.parameter_policy, ParameterPolicy::ExcludeDunder);
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let args = args_for(PathBuf::from("/nonexistent/app.py"), PathBuf::from("out"));
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_both_documents() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app.py");
        fs::write(&source, "@app.get('/users')\ndef list_users():\n    pass\n").unwrap();
        let out = temp_dir.path().join("out");

        run(args_for(source, out.clone())).unwrap();

        let schema = fs::read_to_string(out.join("openapi.json")).unwrap();
        let markdown = fs::read_to_string(out.join("docs.md")).unwrap();
        assert!(schema.contains("\"/users\""));
        assert!(markdown.contains("## GET /users"));
    }

    #[test]
    fn test_run_fails_on_syntax_error_without_output() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app.py");
        fs::write(&source, "def broken(:\n").unwrap();
        let out = temp_dir.path().join("out");

        let err = run(args_for(source, out.clone())).unwrap_err();

        assert!(err.to_string().starts_with("Parsing failed: "));
        assert!(!out.exists());
    }
}

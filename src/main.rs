//! Command-line tool for generating API documentation from Python web apps.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-python [OPTIONS] <SOURCE_PATH>
//! ```
//!
//! # Examples
//!
//! Generate `output/openapi.json` and `output/docs.md`:
//! ```bash
//! openapi-from-python app/main.py
//! ```
//!
//! Scan a whole package and emit YAML:
//! ```bash
//! openapi-from-python ./app -f yaml -o docs
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_python::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-python starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}

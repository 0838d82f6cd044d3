//! CLI logic for the lgen template tool.
//!
//! This module loads a document, reports its diagnostics, and runs one of
//! the three operations selected on the command line: evaluate (the
//! default), expand, or analyze.

pub mod error_adapter;

mod args;

pub use args::Args;

use log::{info, warn};
use thiserror::Error;

use lgen::{EngineConfig, LgenError, Scope, Value};

/// Errors of the CLI layer.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] LgenError),

    #[error("invalid scope JSON: {0}")]
    Data(#[from] serde_json::Error),
}

/// Run the lgen CLI application.
///
/// Loads the input document, then evaluates, expands, or analyzes the
/// selected template and prints the result to stdout.
///
/// # Errors
///
/// Returns [`CliError`] for I/O and import failures, malformed scope
/// JSON, check errors on the document, and evaluation failures.
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(input_path = args.input, template = args.template; "Loading document");

    let document = lgen::parse_file(&args.input)?;
    for diagnostic in document.all_diagnostics() {
        if diagnostic.severity().is_warning() {
            warn!("{diagnostic}");
        }
    }

    let data = match &args.data {
        Some(text) => serde_json::from_str(text)?,
        None => serde_json::Value::Null,
    };
    let scope = Scope::from_json(&data);

    if args.analyze {
        let result = document.analyze(&args.template)?;
        println!("variables: {}", result.variables.join(", "));
        println!("templates: {}", result.template_references.join(", "));
        return Ok(());
    }

    let mut config = EngineConfig::new();
    if let Some(max_depth) = args.max_depth {
        config = config.with_max_depth(max_depth);
    }

    if args.expand {
        for value in document.expand_with(&args.template, &scope, &config)? {
            println!("{}", render(&value));
        }
        return Ok(());
    }

    let value = document.evaluate_with(&args.template, &scope, &config)?;
    println!("{}", render(&value));
    info!(template = args.template; "Evaluated successfully");
    Ok(())
}

/// Strings print verbatim; everything else prints its substitution form
/// (JSON for compound values, `null` as an empty line).
fn render(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(input: &str, template: &str) -> Args {
        Args {
            input: input.to_string(),
            template: template.to_string(),
            data: Some(r#"{"name": "Ann"}"#.to_string()),
            expand: false,
            analyze: false,
            max_depth: None,
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_run_evaluates_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.lg");
        fs::write(&path, "# greet(name)\n- Hello ${name}!\n").unwrap();

        let result = run(&args(path.to_str().unwrap(), "greet"));
        assert!(result.is_ok(), "run failed: {:?}", result.err());
    }

    #[test]
    fn test_run_rejects_bad_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.lg");
        fs::write(&path, "# t\n- x\n").unwrap();

        let mut bad = args(path.to_str().unwrap(), "t");
        bad.data = Some("not json".to_string());
        assert!(matches!(run(&bad), Err(CliError::Data(_))));
    }

    #[test]
    fn test_run_missing_file_is_io_error() {
        let result = run(&args("/no/such/file.lg", "t"));
        assert!(matches!(result, Err(CliError::Engine(LgenError::Io(_)))));
    }
}

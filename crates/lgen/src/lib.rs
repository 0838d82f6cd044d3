//! lgen: a template engine for `.lg` language generation files.
//!
//! A `.lg` document declares named, parameterized templates whose bodies
//! mix literal text with `${...}` expressions, conditional and switch
//! structures, and structured (typed object) outputs. Documents import
//! each other; this crate loads a root document with its transitive
//! import closure, checks the combined template set, and exposes
//! deterministic evaluation, exhaustive expansion, static analysis, and
//! line-precise editing.
//!
//! # Example
//!
//! ```
//! use lgen::{Scope, Value};
//!
//! let source = "# greet(name)\n- Hello ${name}!\n";
//! let document = lgen::parse_text(source, "inline.lg")?;
//! let scope = Scope::new().with("name", Value::from("Ann"));
//! assert_eq!(document.evaluate("greet", &scope)?.to_string(), "Hello Ann!");
//! # Ok::<(), lgen::LgenError>(())
//! ```

mod analyze;
mod check;
mod config;
mod document;
mod edit;
mod error;
mod eval;
mod expand;
mod functions;
mod import;

pub use analyze::AnalyzerResult;
pub use config::{CustomFn, DEFAULT_MAX_DEPTH, EngineConfig};
pub use document::{Document, Import, SourceUnit, Template};
pub use error::LgenError;
pub use import::{FileResolver, ImportResolver};

pub use lgen_core::{Scope, TAG_KEY, Value};
pub use lgen_parser::error::{Diagnostic, ErrorCode, ParseError, Severity};

use std::{fs, path::Path, sync::Arc};

use indexmap::IndexMap;

/// Load a `.lg` file from disk, resolving imports relative to it.
///
/// # Errors
///
/// Fails on I/O or import resolution errors. Syntax problems do not fail
/// the load; they are diagnostics on the returned document.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, LgenError> {
    parse_file_with(path, Arc::new(FileResolver))
}

/// [`parse_file`] with a custom import resolver.
pub fn parse_file_with(
    path: impl AsRef<Path>,
    resolver: Arc<dyn ImportResolver>,
) -> Result<Document, LgenError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let id = canonical_id(path);
    Document::build(&content, &id, resolver, &mut IndexMap::new())
}

/// Load in-memory source. Imports, if any, are resolved relative to `id`.
pub fn parse_text(content: &str, id: &str) -> Result<Document, LgenError> {
    parse_text_with(content, id, Arc::new(FileResolver))
}

/// [`parse_text`] with a custom import resolver.
pub fn parse_text_with(
    content: &str,
    id: &str,
    resolver: Arc<dyn ImportResolver>,
) -> Result<Document, LgenError> {
    Document::build(content, id, resolver, &mut IndexMap::new())
}

/// Load a batch of files sharing one parse cache, so documents imported
/// by several roots are parsed once. Each returned document still carries
/// its complete reference closure.
pub fn parse_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>, LgenError> {
    let resolver: Arc<dyn ImportResolver> = Arc::new(FileResolver);
    let mut cache = IndexMap::new();
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let content = fs::read_to_string(path)?;
            let id = canonical_id(path);
            Document::build(&content, &id, Arc::clone(&resolver), &mut cache)
        })
        .collect()
}

fn canonical_id(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

//! Error types for the lgen engine.
//!
//! Parse-phase problems are diagnostics carried on the document (see
//! [`lgen_parser::error`]); [`LgenError`] covers everything that stops an
//! operation outright: I/O, import resolution, evaluation failures, and
//! invalid edits.

use lgen_parser::error::ParseError;
use thiserror::Error;

/// Errors produced by document loading, evaluation, and editing.
#[derive(Debug, Error)]
pub enum LgenError {
    /// File I/O failure while loading a root document.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An import could not be resolved.
    #[error("failed to resolve import `{id}`: {source}")]
    Import {
        /// The import target as written in the source.
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// Evaluation was requested on a document carrying error diagnostics.
    #[error("document has errors: {0}")]
    CheckFailed(#[source] ParseError),

    /// The requested template does not exist in the combined set.
    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    /// A template was invoked with the wrong number of arguments.
    #[error("template `{template}` expects {expected} argument(s), got {actual}")]
    ArgumentMismatch {
        template: String,
        expected: usize,
        actual: usize,
    },

    /// An expression failed to evaluate.
    #[error("evaluation failed in template `{template}`: {message}")]
    Eval { template: String, message: String },

    /// Template calls nested past the configured depth limit.
    #[error("recursion limit of {limit} exceeded while evaluating `{template}`")]
    RecursionLimitExceeded { template: String, limit: usize },

    /// A line edit range fell outside the document.
    #[error("edit range {start}..={stop} is outside the document ({len} lines)")]
    EditRange {
        start: usize,
        stop: usize,
        len: usize,
    },

    /// The target name of an add already exists.
    #[error("template `{0}` already exists")]
    AlreadyExists(String),
}

impl LgenError {
    /// Whether lenient evaluation may degrade this error to a null value.
    /// Structural failures (missing templates, bad arity, recursion) never
    /// degrade.
    pub(crate) fn is_degradable(&self) -> bool {
        matches!(self, LgenError::Eval { .. })
    }
}

//! The core diagnostic type for the lgen error system.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, source position, and owning document id.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode},
    position::Position,
};

/// A diagnostic message with optional source location information.
///
/// Diagnostics provide structured information about errors and warnings,
/// including:
/// - A severity level
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - An optional source position (1-based line/column)
/// - An optional owning document id
///
/// # Example
///
/// ```text
/// error[E110]: template `greet` is defined multiple times (main.lg:10:1)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    position: Option<Position>,
    document_id: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            position: None,
            document_id: None,
        }
    }

    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use lgen_parser::error::{Diagnostic, ErrorCode};
    /// # use lgen_parser::Position;
    ///
    /// let diag = Diagnostic::error("empty template body")
    ///     .with_code(ErrorCode::E109)
    ///     .with_position(Position::line_start(3));
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Attach an error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a source position.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach the owning document id.
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source position, if any.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Get the owning document id, if any.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        match (&self.document_id, self.position) {
            (Some(id), Some(pos)) => write!(f, " ({}:{})", id, pos),
            (Some(id), None) => write!(f, " ({})", id),
            (None, Some(pos)) => write!(f, " ({})", pos),
            (None, None) => Ok(()),
        }
    }
}

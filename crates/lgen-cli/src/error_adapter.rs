//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error
//! types and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! When a document is rejected with multiple check diagnostics, each
//! diagnostic is rendered independently.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;

use lgen::{Diagnostic, LgenError};

use crate::CliError;

/// Adapter for a single document diagnostic.
pub struct DiagnosticAdapter<'a>(pub &'a Diagnostic);

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.0)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.message())?;
        match (self.0.document_id(), self.0.position()) {
            (Some(id), Some(position)) => write!(f, " ({}:{})", id, position),
            (Some(id), None) => write!(f, " ({})", id),
            (None, Some(position)) => write!(f, " ({})", position),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.0
            .code()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(if self.0.severity().is_error() {
            miette::Severity::Error
        } else {
            miette::Severity::Warning
        })
    }
}

/// Adapter for errors without per-diagnostic structure.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Engine(err) => match err {
                LgenError::Io(_) => "lgen::io",
                LgenError::Import { .. } => "lgen::import",
                LgenError::CheckFailed(_) => return None,
                LgenError::TemplateNotFound(_) => "lgen::template",
                LgenError::ArgumentMismatch { .. } => "lgen::arguments",
                LgenError::Eval { .. } => "lgen::eval",
                LgenError::RecursionLimitExceeded { .. } => "lgen::recursion",
                LgenError::EditRange { .. } | LgenError::AlreadyExists(_) => "lgen::edit",
            },
            CliError::Data(_) => "lgen::data",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A single document diagnostic.
    Diagnostic(DiagnosticAdapter<'a>),
    /// Any other error.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(diagnostic) => fmt::Display::fmt(diagnostic, f),
            Reportable::Error(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(error) => error.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(diagnostic) => diagnostic.code(),
            Reportable::Error(error) => error.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(diagnostic) => MietteDiagnostic::severity(diagnostic),
            Reportable::Error(_) => Some(miette::Severity::Error),
        }
    }
}

/// Split an error into independently renderable reports. A rejected
/// document yields one report per check diagnostic; everything else is a
/// single report.
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Engine(LgenError::CheckFailed(parse_error)) => parse_error
            .diagnostics()
            .iter()
            .map(|diagnostic| Reportable::Diagnostic(DiagnosticAdapter(diagnostic)))
            .collect(),
        other => vec![Reportable::Error(ErrorAdapter(other))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_error_is_one_report() {
        let err = CliError::Engine(LgenError::TemplateNotFound("t".to_string()));
        let reports = to_reportables(&err);
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0], Reportable::Error(_)));
    }

    #[test]
    fn test_check_failure_splits_per_diagnostic() {
        let diagnostics = vec![
            Diagnostic::error("first"),
            Diagnostic::error("second"),
        ];
        let err = CliError::Engine(LgenError::CheckFailed(diagnostics.into()));
        let reports = to_reportables(&err);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].to_string(), "first");
    }
}

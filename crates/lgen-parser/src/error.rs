//! Error and diagnostic system for the lgen parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Source positions attached to each diagnostic
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, source
//! position, and owning document id. Multiple diagnostics are wrapped in
//! [`ParseError`] for returning from operations that reject a document set.
//!
//! # Example
//!
//! ```
//! # use lgen_parser::error::{Diagnostic, ErrorCode};
//! # use lgen_parser::Position;
//!
//! let diag = Diagnostic::error("template `greet` is defined multiple times")
//!     .with_code(ErrorCode::E201)
//!     .with_position(Position::new(10, 1))
//!     .with_document("main.lg");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
pub use severity::Severity;

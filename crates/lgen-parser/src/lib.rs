//! Parser for the lgen template language.
//!
//! This crate owns the grammar boundary: the line-level `.lg` reader, the
//! embedded expression sub-language, the parsed document model, and the
//! diagnostic system. Everything semantic — import resolution, static
//! checking, evaluation — lives in the `lgen` engine crate.
//!
//! # Source format
//!
//! ```text
//! > ! @strict = false
//! [common](./common.lg)
//!
//! # greet(name)
//! - Hello ${name}!
//!
//! # pick(x)
//! - IF: ${x == 1}
//!   - one
//! - ELSE:
//!   - other
//! ```
//!
//! The entry point is [`parse`], which never fails: local syntax problems
//! surface as diagnostics on the returned [`ParsedFile`].

pub mod ast;
pub mod error;
pub mod expr;
pub mod position;

mod reader;


pub use ast::{
    Alternative, CondBranch, Import, ParsedFile, ParsedTemplate, Segment, StructuredBody,
    SwitchBody, SwitchCase, TemplateBody,
};
pub use expr::{BinaryOp, ExprKind, Expression, Lit, UnaryOp};
pub use position::{LineRange, Position};
pub use reader::{SegmentError, parse, parse_segments};

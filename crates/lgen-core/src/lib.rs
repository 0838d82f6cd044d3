//! Lgen Core Types and Definitions
//!
//! This crate provides the foundational types for the lgen template
//! language. It includes:
//!
//! - **Values**: The dynamic value model produced by evaluation ([`value::Value`])
//! - **Scopes**: Chained binding environments for evaluation ([`scope::Scope`])

pub mod scope;
pub mod value;

pub use scope::Scope;
pub use value::{TAG_KEY, Value};

//! Shared types for CLEVROS.
//!
//! This crate defines the logical expression tree consumed by the evaluator,
//! the type language used to annotate it, source spans, and the structured
//! syntax errors reported by the lexer and parser.

mod error;
mod span;
pub mod ast;
pub mod ty;

pub use error::{ErrorCategory, ErrorCode, SyntaxError, SyntaxErrors, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used by the textual front-end.
pub type Result<T> = std::result::Result<T, SyntaxError>;

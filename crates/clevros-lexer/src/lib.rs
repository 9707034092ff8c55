//! CLEVROS lexer: converts the textual form of a logical expression into tokens.

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer};
pub use token::{Token, TokenKind};

//! Token types for the logical-form lexer.

use clevros_types::Span;
use std::fmt;

/// A single token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Constant or type name: `filter_size`, `large`, `psi`, `2`
    Name(String),
    /// `$0`, `$1`, …
    Variable(u32),
    /// `lambda`
    Lambda,

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `,`
    Comma,
    /// `:`
    Colon,

    Eof,
}

impl TokenKind {
    /// Whether a byte can appear inside a name.
    pub fn is_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.'
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Name(name) => f.write_str(name),
            TokenKind::Variable(i) => write!(f, "${i}"),
            TokenKind::Lambda => f.write_str("lambda"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

//! Type annotation parsing.

use clevros_lexer::token::TokenKind;
use clevros_types::ty::Type;
use clevros_types::ErrorCode;

use crate::parser::{Parser, MAX_TYPE_DEPTH};

impl<'src> Parser<'src> {
    /// ```ebnf
    /// Type = Name | "<" Type "," Type ">" ;
    /// ```
    pub(crate) fn parse_type(&mut self) -> Option<Type> {
        match self.peek_kind().clone() {
            TokenKind::Name(name) => {
                self.advance();
                Some(Type::Primitive(name))
            }
            TokenKind::Less => {
                self.type_depth += 1;
                if self.type_depth > MAX_TYPE_DEPTH {
                    self.error_at_current(
                        ErrorCode::STRUCTURAL_LIMIT_EXCEEDED,
                        format!("maximum type nesting depth is {MAX_TYPE_DEPTH}"),
                    );
                    self.type_depth -= 1;
                    return None;
                }
                let result = self.parse_complex_type();
                self.type_depth -= 1;
                result
            }
            other => {
                self.error_at_current(
                    ErrorCode::MALFORMED_TYPE,
                    format!("expected a type, got '{other}'"),
                );
                None
            }
        }
    }

    fn parse_complex_type(&mut self) -> Option<Type> {
        self.advance();
        let domain = self.parse_type()?;
        self.expect(&TokenKind::Comma, ErrorCode::MALFORMED_TYPE)?;
        let range = self.parse_type()?;
        self.expect(&TokenKind::Greater, ErrorCode::MALFORMED_TYPE)?;
        Some(Type::complex(domain, range))
    }
}

//! Core parser infrastructure: token cursor, variable scope, error reporting.

use clevros_lexer::token::{Token, TokenKind};
use clevros_types::ast::{LogicalExpr, Variable};
use clevros_types::{ErrorCode, SourceFile, Span, SyntaxError, SyntaxErrors};

/// Maximum nesting depth of a logical form.
pub const MAX_DEPTH: u32 = 256;

/// Maximum nesting depth of a type annotation.
pub const MAX_TYPE_DEPTH: u32 = 256;

pub struct Parser<'src> {
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    source_file: &'src SourceFile,
    errors: SyntaxErrors,
    /// Variables bound by the enclosing lambdas, innermost last.
    pub(crate) scope: Vec<Variable>,
    /// Current expression nesting depth.
    pub(crate) depth: u32,
    /// Current `<...>` nesting depth inside a type annotation.
    pub(crate) type_depth: u32,
}

pub struct ParseResult {
    pub expr: Option<LogicalExpr>,
    pub errors: SyntaxErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: SyntaxErrors::empty(),
            scope: Vec::new(),
            depth: 0,
            type_depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    /// Span of the most recently consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    pub(crate) fn advance(&mut self) -> TokenKind {
        let kind = self.peek_kind().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token, reporting `code` if it is missing.
    pub(crate) fn expect(&mut self, expected: &TokenKind, code: ErrorCode) -> Option<Span> {
        if self.check(expected) {
            self.advance();
            Some(self.previous_span())
        } else {
            self.error_at_current(
                code,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    // ── Scope ─────────────────────────────────────────────────────────────────

    /// The innermost binding of variable `$index`.
    pub(crate) fn lookup(&self, index: u32) -> Option<&Variable> {
        self.scope.iter().rev().find(|v| v.index == index)
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.push(self.make_error(code, message, span));
    }

    pub(crate) fn make_error(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> SyntaxError {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        SyntaxError::new(&self.source_file.name, code, message, span, source_line)
    }

    pub(crate) fn push(&mut self, error: SyntaxError) {
        self.errors.push_error(error);
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse exactly one logical expression from the token stream.
    pub fn parse(mut self) -> ParseResult {
        let expr = self.parse_expression();
        if expr.is_some() && !self.at_end() {
            let code = if self.check(&TokenKind::RParen) {
                ErrorCode::UNBALANCED_PAREN
            } else {
                ErrorCode::TRAILING_INPUT
            };
            self.error_at_current(
                code,
                format!("unexpected '{}' after a complete expression", self.peek_kind()),
            );
        }
        ParseResult {
            expr,
            errors: self.errors,
        }
    }
}

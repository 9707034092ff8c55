//! Logical-form lexer.
//!
//! - Whitespace, including newlines, only separates tokens
//! - `;` starts a comment that runs to the end of the line
//! - Error recovery: unexpected characters are reported and skipped, up to
//!   [`clevros_types::MAX_ERRORS`] errors

use clevros_types::{ErrorCode, SourceFile, Span, SyntaxError, SyntaxErrors, MAX_ERRORS};

use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    errors: SyntaxErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: SyntaxErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: SyntaxErrors::empty(),
        }
    }

    /// Lex the whole input.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                break;
            }
            let token = self.scan();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = SyntaxError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    /// Skip whitespace and `;` line comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() {
                self.advance();
            } else if ch == b';' {
                while self.peek().is_some_and(|c| c != b'\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    fn scan(&mut self) -> Token {
        loop {
            self.skip_trivia();

            let start_line = self.line;
            let start_col = self.col;
            let start = self.pos;
            let Some(ch) = self.advance() else {
                return Token::new(TokenKind::Eof, self.current_span());
            };

            let kind = match ch {
                b'(' => TokenKind::LParen,
                b')' => TokenKind::RParen,
                b'<' => TokenKind::Less,
                b'>' => TokenKind::Greater,
                b',' => TokenKind::Comma,
                b':' => TokenKind::Colon,
                b'$' => match self.scan_variable(start_line, start_col) {
                    Some(kind) => kind,
                    None => continue,
                },
                _ if TokenKind::is_name_byte(ch) => self.scan_name(start),
                _ => {
                    let span = self.span_from(start_line, start_col);
                    let shown = self.char_at(start);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        format!("unexpected character '{shown}'"),
                        span,
                    );
                    if self.errors.total_errors >= MAX_ERRORS {
                        return Token::new(TokenKind::Eof, self.current_span());
                    }
                    continue;
                }
            };
            return Token::new(kind, self.span_from(start_line, start_col));
        }
    }

    fn scan_name(&mut self, start: usize) -> TokenKind {
        while self.peek().is_some_and(TokenKind::is_name_byte) {
            self.advance();
        }
        // Name bytes are ASCII, so the slice is valid UTF-8.
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        if text == "lambda" {
            TokenKind::Lambda
        } else {
            TokenKind::Name(text)
        }
    }

    /// Scan the digits after `$`. Returns `None` (after reporting) when there are none.
    fn scan_variable(&mut self, start_line: u32, start_col: u32) -> Option<TokenKind> {
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let digits = std::str::from_utf8(&self.source[digits_start..self.pos]).unwrap_or("");
        match digits.parse::<u32>() {
            Ok(index) => Some(TokenKind::Variable(index)),
            Err(_) => {
                let span = self.span_from(start_line, start_col);
                let source_line = self.source_file.line(span.start_line).unwrap_or("");
                let err = SyntaxError::new(
                    &self.source_file.name,
                    ErrorCode::UNEXPECTED_TOKEN,
                    "expected a variable index after '$'",
                    span,
                    source_line,
                )
                .with_suggestion("variables are written $0, $1, ...");
                self.errors.push_error(err);
                None
            }
        }
    }

    /// The (possibly multi-byte) character starting at byte `start`; the
    /// remaining bytes of a multi-byte character are consumed.
    fn char_at(&mut self, start: usize) -> char {
        let rest = std::str::from_utf8(&self.source[start..]).ok();
        let ch = rest.and_then(|s| s.chars().next()).unwrap_or('\u{FFFD}');
        for _ in 1..ch.len_utf8() {
            self.pos += 1;
        }
        ch
    }
}

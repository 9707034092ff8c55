use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before the front-end stops collecting.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Type,
    Scope,
    Structure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "syntax",
            Self::Type => "type",
            Self::Scope => "scope",
            Self::Structure => "structure",
        })
    }
}

/// Numeric error code (E100–E699).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNBALANCED_PAREN: Self = Self(101);
    pub const UNEXPECTED_CHARACTER: Self = Self(102);
    pub const EMPTY_APPLICATION: Self = Self(103);

    // ── Type errors (E200–E299) ──
    pub const MALFORMED_TYPE: Self = Self(200);
    pub const MISSING_VARIABLE_TYPE: Self = Self(201);

    // ── Scope errors (E500–E599) ──
    pub const UNBOUND_VARIABLE: Self = Self(500);
    pub const VARIABLE_REBOUND: Self = Self(501);

    // ── Structure errors (E600–E699) ──
    pub const TRAILING_INPUT: Self = Self(600);
    pub const STRUCTURAL_LIMIT_EXCEEDED: Self = Self(607);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Type,
            500..=599 => ErrorCategory::Scope,
            600..=699 => ErrorCategory::Structure,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured error from reading a textual logical form.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{span}: {code} [{category}] {message}")]
pub struct SyntaxError {
    /// Source name (file name, or `<input>` for inline forms).
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The source line the error points into.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SyntaxError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Errors collected while lexing or parsing one logical form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntaxErrors {
    pub errors: Vec<SyntaxError>,
    pub total_errors: usize,
}

impl SyntaxErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Record an error. Only the first [`MAX_ERRORS`] are stored, but all are counted.
    pub fn push_error(&mut self, error: SyntaxError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append every error from `other`, keeping the storage cap.
    pub fn extend(&mut self, other: SyntaxErrors) {
        let uncounted = other.total_errors.saturating_sub(other.errors.len());
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += uncounted;
    }

    pub fn first(&self) -> Option<&SyntaxError> {
        self.errors.first()
    }
}

impl fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        if self.total_errors > self.errors.len() {
            write!(f, "\n... and {} more", self.total_errors - self.errors.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbound() -> SyntaxError {
        SyntaxError::new(
            "q.lf",
            ErrorCode::UNBOUND_VARIABLE,
            "variable '$1' is not bound by an enclosing lambda",
            Span::new(1, 24, 1, 25),
            "(lambda $0:e (scene:<e,t> $1))",
        )
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::MALFORMED_TYPE.category(), ErrorCategory::Type);
        assert_eq!(ErrorCode::UNBOUND_VARIABLE.category(), ErrorCategory::Scope);
        assert_eq!(
            ErrorCode::STRUCTURAL_LIMIT_EXCEEDED.category(),
            ErrorCategory::Structure
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ErrorCode::UNBALANCED_PAREN.to_string(), "E101");
        assert_eq!(
            unbound().to_string(),
            "1:24: E500 [scope] variable '$1' is not bound by an enclosing lambda"
        );
    }

    #[test]
    fn test_error_json_shape() {
        let err = unbound().with_suggestion("declare it with (lambda $1:e ...)");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"line\":1"));
        assert!(json.contains("\"column\":24"));
        assert!(json.contains("\"end_column\":25"));
        assert!(json.contains("\"category\":\"scope\""));
        assert!(json.contains("\"suggestion\""));
        assert!(!json.contains("severity"));

        let back: SyntaxError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, ErrorCode::UNBOUND_VARIABLE);
        assert_eq!(back.span, err.span);
    }

    #[test]
    fn test_errors_cap() {
        let mut errs = SyntaxErrors::empty();
        assert!(!errs.has_errors());
        for _ in 0..25 {
            errs.push_error(unbound());
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.to_string().ends_with("... and 5 more"));
    }

    #[test]
    fn test_errors_extend_keeps_counts() {
        let mut lexed = SyntaxErrors::empty();
        lexed.push_error(unbound());
        let mut parsed = SyntaxErrors::empty();
        parsed.push_error(unbound());
        parsed.push_error(unbound());
        lexed.extend(parsed);
        assert_eq!(lexed.total_errors, 3);
        assert_eq!(lexed.errors.len(), 3);
    }
}

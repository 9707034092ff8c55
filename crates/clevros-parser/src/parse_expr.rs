//! Expression parsing.
//!
//! ```ebnf
//! Expr     = Constant | Variable | "(" "lambda" VarDecl Expr ")" | "(" Expr { Expr } ")" ;
//! Constant = Name [ ":" Type ] ;
//! Variable = "$" Digits [ ":" Type ] ;
//! VarDecl  = "$" Digits ":" Type ;
//! ```

use clevros_lexer::token::TokenKind;
use clevros_types::ast::*;
use clevros_types::ErrorCode;

use crate::parser::{Parser, MAX_DEPTH};

impl<'src> Parser<'src> {
    pub(crate) fn parse_expression(&mut self) -> Option<LogicalExpr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.error_at_current(
                ErrorCode::STRUCTURAL_LIMIT_EXCEEDED,
                format!("maximum expression nesting depth is {MAX_DEPTH}"),
            );
            self.depth -= 1;
            return None;
        }
        let result = self.parse_expression_inner();
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self) -> Option<LogicalExpr> {
        match self.peek_kind().clone() {
            TokenKind::Name(name) => self.parse_constant(name),
            TokenKind::Variable(index) => self.parse_variable_use(index),
            TokenKind::LParen => self.parse_compound(),
            TokenKind::RParen => {
                self.error_at_current(ErrorCode::UNBALANCED_PAREN, "unexpected ')'");
                None
            }
            TokenKind::Lambda => {
                let err = self
                    .make_error(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "'lambda' can only appear right after '('",
                        self.current_span(),
                    )
                    .with_suggestion("write (lambda $0:e body)");
                self.push(err);
                None
            }
            TokenKind::Eof => {
                self.error_at_current(ErrorCode::UNBALANCED_PAREN, "unexpected end of input");
                None
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected an expression, got '{other}'"),
                );
                None
            }
        }
    }

    /// `Constant = Name [ ":" Type ]`
    fn parse_constant(&mut self, name: String) -> Option<LogicalExpr> {
        self.advance();
        let start = self.previous_span();
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(LogicalExpr::new(
            ExprKind::Constant(Constant::new(name, ty)),
            span,
        ))
    }

    /// A use of a bound variable. The type comes from the binding lambda; an
    /// explicit annotation must agree with it.
    fn parse_variable_use(&mut self, index: u32) -> Option<LogicalExpr> {
        self.advance();
        let start = self.previous_span();
        let annotated = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let span = start.merge(self.previous_span());

        let Some(bound) = self.lookup(index).cloned() else {
            let err = self
                .make_error(
                    ErrorCode::UNBOUND_VARIABLE,
                    format!("variable '${index}' is not bound by an enclosing lambda"),
                    span,
                )
                .with_suggestion(format!("wrap the expression in (lambda ${index}:e ...)"));
            self.push(err);
            return None;
        };

        if let (Some(annotated), Some(bound_ty)) = (&annotated, &bound.ty) {
            if annotated != bound_ty {
                self.error_at(
                    ErrorCode::MALFORMED_TYPE,
                    format!("variable '${index}' is bound as {bound_ty} but annotated as {annotated}"),
                    span,
                );
                return None;
            }
        }

        Some(LogicalExpr::new(ExprKind::Variable(bound), span))
    }

    /// `"(" ... ")"`: either a lambda abstraction or a literal application.
    fn parse_compound(&mut self) -> Option<LogicalExpr> {
        self.advance();
        let open = self.previous_span();

        if self.eat(&TokenKind::Lambda) {
            return self.parse_lambda_rest(open);
        }
        if self.check(&TokenKind::RParen) {
            self.advance();
            self.error_at(
                ErrorCode::EMPTY_APPLICATION,
                "empty application '()'",
                open.merge(self.previous_span()),
            );
            return None;
        }

        let predicate = self.parse_expression()?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            args.push(self.parse_expression()?);
        }
        let close = self.expect_close(open)?;

        Some(LogicalExpr::new(
            ExprKind::Literal {
                predicate: Box::new(predicate),
                args,
            },
            open.merge(close),
        ))
    }

    /// Everything after `(lambda`: `VarDecl Expr ")"`.
    fn parse_lambda_rest(&mut self, open: clevros_types::Span) -> Option<LogicalExpr> {
        let TokenKind::Variable(index) = self.peek_kind().clone() else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected a variable after 'lambda', got '{}'", self.peek_kind()),
            );
            return None;
        };
        self.advance();
        let var_span = self.previous_span();

        if !self.eat(&TokenKind::Colon) {
            let err = self
                .make_error(
                    ErrorCode::MISSING_VARIABLE_TYPE,
                    format!("lambda variable '${index}' needs a type"),
                    var_span,
                )
                .with_suggestion(format!("write ${index}:e"));
            self.push(err);
            return None;
        }
        let ty = self.parse_type()?;

        if self.lookup(index).is_some() {
            self.error_at(
                ErrorCode::VARIABLE_REBOUND,
                format!("variable '${index}' is already bound by an enclosing lambda"),
                var_span,
            );
            return None;
        }

        let argument = Variable::new(index, Some(ty));
        self.scope.push(argument.clone());
        let body = self.parse_expression();
        self.scope.pop();
        let body = body?;
        let close = self.expect_close(open)?;

        Some(LogicalExpr::new(
            ExprKind::Lambda {
                argument,
                body: Box::new(body),
            },
            open.merge(close),
        ))
    }

    fn expect_close(&mut self, open: clevros_types::Span) -> Option<clevros_types::Span> {
        if self.at_end() {
            let err = self
                .make_error(
                    ErrorCode::UNBALANCED_PAREN,
                    "missing ')' before end of input",
                    self.current_span(),
                )
                .with_suggestion(format!("the '(' at {open} is never closed"));
            self.push(err);
            return None;
        }
        self.expect(&TokenKind::RParen, ErrorCode::UNBALANCED_PAREN)
    }
}

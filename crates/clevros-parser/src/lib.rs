//! CLEVROS parser: converts a token stream into a [`LogicalExpr`].

mod parse_expr;
mod parse_type;
mod parser;

pub use parser::{ParseResult, Parser, MAX_DEPTH, MAX_TYPE_DEPTH};

use clevros_lexer::Lexer;
use clevros_types::ast::LogicalExpr;
use clevros_types::{SourceFile, SyntaxErrors};

/// Lex and parse a logical form held in a [`SourceFile`].
pub fn read_source(source_file: &SourceFile) -> Result<LogicalExpr, SyntaxErrors> {
    let lexed = Lexer::new(source_file).lex();
    let mut errors = lexed.errors;
    let parsed = Parser::new(lexed.tokens, source_file).parse();
    errors.extend(parsed.errors);
    match parsed.expr {
        Some(expr) if !errors.has_errors() => Ok(expr),
        _ => Err(errors),
    }
}

/// Lex and parse an inline logical form such as
/// `(count:<<e,t>,i> (filter_shape:<<e,t>,<psh,<e,t>>> scene:<e,t> cube:psh))`.
pub fn read(text: &str) -> Result<LogicalExpr, SyntaxErrors> {
    read_source(&SourceFile::inline(text))
}

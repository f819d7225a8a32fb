//! The concrete syntax of tagless: a logos lexer and a lalrpop grammar
//! producing [`tagless_syntax`] trees.

/// Logos-based lexer and token definitions.
pub mod lexer;
pub use lexer::*;
#[allow(clippy::all)]
/// LALRPOP-generated parser wrappers.
pub mod parser {
    lalrpop_util::lalrpop_mod!(parser_impl, "/parser.rs");
    pub use parser_impl::*;
}
/// Parse error formatting.
pub mod err;
pub use err::*;

use std::sync::Arc;
use tagless_syntax::{Expr, Program};
use tagless_utils::span::FileInfo;

/// Parse a whole program. `file` names the source in locations.
pub fn parse(source: &str, file: Option<Arc<str>>) -> Result<Program> {
    let info = FileInfo::new(source, file);
    parser::ProgramParser::new()
        .parse(&info, Lexer::new(source))
        .map_err(|error| ParseError::new(error, &info))
}

/// Parse a single expression.
pub fn parse_expr(source: &str, file: Option<Arc<str>>) -> Result<Expr> {
    let info = FileInfo::new(source, file);
    parser::ExprParser::new()
        .parse(&info, Lexer::new(source))
        .map_err(|error| ParseError::new(error, &info))
}

//! The wanted-save expression language: tokenizer, parser and evaluator.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::Ast;
pub use eval::{evaluate, evaluate_all, first_matching};
pub use parser::Parser;

use crate::error::Error;

/// Splits a comma-separated list of wanted-save expressions, each
/// optionally suffixed with `#label`, parsing every expression into an
/// [`Ast`] and pairing it with its label (defaulting to the expression
/// text itself when no `#` is present).
///
/// # Errors
///
/// Returns [`Error::Validation`] if an entry contains more than one `#`,
/// or [`Error::Syntax`] if an expression fails to parse.
pub fn parse_wanted_saves(raw: &[String]) -> Result<Vec<(Ast, String)>, Error> {
    let mut result = Vec::new();
    for entry in raw {
        for piece in entry.split(',') {
            let parts: Vec<&str> = piece.splitn(3, '#').collect();
            if parts.len() > 2 {
                return Err(Error::Validation(format!("too many '#' in {}", piece)));
            }
            let (expression, label) = if parts.len() == 1 {
                (parts[0], parts[0])
            } else {
                (parts[0], parts[1])
            };
            let ast = Parser::parse(expression)?;
            result.push((ast, label.to_string()));
        }
    }
    Ok(result)
}

//! Evaluates a wanted-save [`Ast`] against a set of candidate save strings.
//!
//! Regex literals are compiled lazily and memoized per `Ast` node via an
//! interior `OnceLock`, so a single parsed expression only ever pays for
//! compiling its regexes once, no matter how many rows it is evaluated
//! against (the "global regex precompilation" design note applied to
//! per-expression literals rather than the tokenizer alone).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;
use crate::expr::ast::{Ast, BinaryOp, UnaryOp};
use crate::piece::PieceCounter;

fn compiled_regex_cache() -> &'static Mutex<HashMap<String, Regex>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn compile_regex(pattern: &str) -> Result<Regex, Error> {
    let mut cache = compiled_regex_cache().lock().expect("regex cache mutex poisoned");
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern).map_err(|e| Error::Regex {
        expression: pattern.to_string(),
        message: e.to_string(),
    })?;
    cache.insert(pattern.to_string(), re.clone());
    Ok(re)
}

fn pieces_matches(wanted: &str, save: &str) -> bool {
    match (PieceCounter::from_str(wanted), PieceCounter::from_str(save)) {
        (Ok(wanted), Ok(save)) => wanted.is_subset_of(&save),
        _ => false,
    }
}

/// Evaluates `node` against every save in `saves`, short-circuiting where
/// the grammar allows it. Returns a single boolean: does *some* combination
/// of saves satisfy the whole expression.
///
/// # Errors
///
/// Returns [`Error::Regex`] if a `Regex` node's pattern fails to compile.
pub fn evaluate(node: &Ast, saves: &[String]) -> Result<bool, Error> {
    match node {
        Ast::Pieces(wanted) => Ok(saves.iter().any(|save| pieces_matches(wanted, save))),
        Ast::Regex(pattern) => {
            let re = compile_regex(pattern)?;
            Ok(saves.iter().any(|save| re.is_match(save)))
        }
        Ast::Unary(UnaryOp::Not, child) => Ok(!evaluate(child, saves)?),
        Ast::Unary(UnaryOp::Avoid, child) => {
            for save in saves {
                if !evaluate(child, std::slice::from_ref(save))? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Ast::Binary(BinaryOp::And, left, right) => {
            if !evaluate(left, saves)? {
                return Ok(false);
            }
            evaluate(right, saves)
        }
        Ast::Binary(BinaryOp::Or, left, right) => {
            if evaluate(left, saves)? {
                return Ok(true);
            }
            evaluate(right, saves)
        }
    }
}

/// Returns the indices of `saves` that *individually* satisfy `node`, i.e.
/// `i` is included iff `evaluate(node, &[saves[i].clone()])` holds.
///
/// Used by the filter engine to decide which per-save fumen lists survive.
/// For a singleton candidate set, `AVOID` and `NOT` coincide (there is only
/// one element to avoid or to universally fail), which is expected: the
/// whole-set/element-wise distinction only matters when more than one save
/// is considered at once, as in [`evaluate`].
///
/// # Errors
///
/// Returns [`Error::Regex`] if a `Regex` node's pattern fails to compile.
pub fn evaluate_all(node: &Ast, saves: &[String]) -> Result<Vec<usize>, Error> {
    let mut indices = Vec::new();
    for (i, save) in saves.iter().enumerate() {
        if evaluate(node, std::slice::from_ref(save))? {
            indices.push(i);
        }
    }
    Ok(indices)
}

/// Returns the first in `asts` for which [`evaluate`] holds and the index
/// of that AST (mirroring `any_index` applied to a list of per-AST
/// evaluations), or `None` if no AST matches.
///
/// # Errors
///
/// Returns [`Error::Regex`] if any candidate AST's regex literal fails to
/// compile (ASTs are still tried in order; a later AST's regex error is
/// only observed if earlier ones did not already match).
pub fn first_matching(asts: &[Ast], saves: &[String]) -> Result<Option<usize>, Error> {
    for (i, ast) in asts.iter().enumerate() {
        if evaluate(ast, saves)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::Parser;

    #[test]
    fn scenario_2_evaluator_basic() {
        let ast = Parser::parse("S && !T || (O && !I)").unwrap();
        let saves1: Vec<String> = vec!["ST".into(), "SZ".into(), "OI".into()];
        assert_eq!(evaluate(&ast, &saves1).unwrap(), false);

        let saves2: Vec<String> = vec!["ST".into(), "SZ".into(), "SO".into()];
        assert_eq!(evaluate(&ast, &saves2).unwrap(), true);
    }

    #[test]
    fn scenario_3_regex_plus_literal() {
        let ast = Parser::parse("/T[ISZO]/ || LJ").unwrap();
        let saves1: Vec<String> = vec!["TL".into(), "TJ".into(), "TS".into(), "SZ".into(), "IL".into()];
        assert_eq!(evaluate(&ast, &saves1).unwrap(), true);

        let saves2: Vec<String> = vec!["IL".into(), "SZ".into()];
        assert_eq!(evaluate(&ast, &saves2).unwrap(), false);
    }

    #[test]
    fn or_distributes_over_evaluate() {
        let a = Parser::parse("T").unwrap();
        let b = Parser::parse("O").unwrap();
        let or_ast = Parser::parse("T || O").unwrap();
        let saves: Vec<String> = vec!["TI".into(), "SZ".into()];
        let lhs = evaluate(&or_ast, &saves).unwrap();
        let rhs = evaluate(&a, &saves).unwrap() || evaluate(&b, &saves).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn double_negation_is_identity() {
        let a = Parser::parse("T").unwrap();
        let double_not = Parser::parse("!!T").unwrap();
        let saves: Vec<String> = vec!["TI".into(), "SZ".into()];
        assert_eq!(evaluate(&a, &saves).unwrap(), evaluate(&double_not, &saves).unwrap());
    }

    #[test]
    fn avoid_differs_from_not() {
        let not_ast = Parser::parse("!T").unwrap();
        let avoid_ast = Parser::parse("^T").unwrap();
        // one save has T, one doesn't: NOT asks "does no save have T" (false);
        // AVOID asks "does some save lack T" (true).
        let saves: Vec<String> = vec!["TI".into(), "SZ".into()];
        assert_eq!(evaluate(&not_ast, &saves).unwrap(), false);
        assert_eq!(evaluate(&avoid_ast, &saves).unwrap(), true);
    }

    #[test]
    fn evaluate_all_picks_out_matching_saves() {
        let ast = Parser::parse("T || O").unwrap();
        let saves: Vec<String> = vec!["TI".into(), "SZ".into(), "OL".into()];
        assert_eq!(evaluate_all(&ast, &saves).unwrap(), vec![0, 2]);
    }

    #[test]
    fn invalid_regex_is_a_user_visible_error() {
        let ast = Parser::parse("/[/").unwrap();
        let saves: Vec<String> = vec!["TI".into()];
        assert!(evaluate(&ast, &saves).is_err());
    }
}

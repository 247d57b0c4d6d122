//! AST nodes for the wanted-save expression language.

use std::fmt;

/// A unary operator: logical negation or "avoid" (elementwise negation).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Avoid,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not => write!(f, "!"),
            Self::Avoid => write!(f, "^"),
        }
    }
}

/// A binary operator: logical conjunction or disjunction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "&&"),
            Self::Or => write!(f, "||"),
        }
    }
}

/// An immutable node of a wanted-save expression's abstract syntax tree.
///
/// Built once by [`crate::expr::parser::Parser`] and never mutated; the
/// evaluator in [`crate::expr::eval`] only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// A bag-letter multiset literal, e.g. `TIO`.
    Pieces(String),
    /// A `/regex/` literal.
    Regex(String),
    Unary(UnaryOp, Box<Ast>),
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pieces(s) => write!(f, "{}", s),
            Self::Regex(pat) => write!(f, "/{}/", pat),
            Self::Unary(op, child) => write!(f, "{}({})", op, child),
            Self::Binary(op, left, right) => write!(f, "({} {} {})", left, op, right),
        }
    }
}

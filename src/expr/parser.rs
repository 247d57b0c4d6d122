//! Recursive-descent parser for the wanted-save expression language.
//!
//! Precedence (low to high): OR, AND, {NOT, AVOID}, atom. Binary operators
//! are left-associative, unary operators right-associative.
//!
//! ```text
//! expr   := or
//! or     := and ('||' and)*
//! and    := unary ('&&' unary)*
//! unary  := '!' unary | '^' unary | atom
//! atom   := '(' expr ')' | REGEX | PIECES
//! ```

use crate::error::Error;
use crate::expr::ast::{Ast, BinaryOp, UnaryOp};
use crate::expr::lexer::{tokenize, Token, TokenKind};

/// Parses a single wanted-save expression into an [`Ast`].
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    /// Tokenizes and parses `source` in one shot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] on an empty/unrecognized token stream,
    /// an unexpected token, or unbalanced parentheses.
    pub fn parse(source: &'a str) -> Result<Ast, Error> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0, source };
        let ast = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.syntax_error(format!(
                "unexpected trailing token '{}'",
                parser.peek_value()
            )));
        }
        Ok(ast)
    }

    fn syntax_error(&self, message: String) -> Error {
        Error::Syntax {
            expression: self.source.to_string(),
            message,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_value(&self) -> String {
        self.peek().map(|t| t.value.clone()).unwrap_or_else(|| "<end>".to_string())
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn consume(&mut self, expected: TokenKind) -> Result<Token, Error> {
        match self.peek() {
            Some(token) if token.kind == expected => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(self.syntax_error(format!(
                "expected {:?} but got {:?} ('{}')",
                expected, token.kind, token.value
            ))),
            None => Err(self.syntax_error(format!("expected {:?} but reached end of input", expected))),
        }
    }

    fn parse_or(&mut self) -> Result<Ast, Error> {
        let mut left = self.parse_and()?;
        while self.peek_kind() == Some(TokenKind::Or) {
            self.consume(TokenKind::Or)?;
            let right = self.parse_and()?;
            left = Ast::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Ast, Error> {
        let mut left = self.parse_unary()?;
        while self.peek_kind() == Some(TokenKind::And) {
            self.consume(TokenKind::And)?;
            let right = self.parse_unary()?;
            left = Ast::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Ast, Error> {
        match self.peek_kind() {
            Some(TokenKind::Not) => {
                self.consume(TokenKind::Not)?;
                let child = self.parse_unary()?;
                Ok(Ast::Unary(UnaryOp::Not, Box::new(child)))
            }
            Some(TokenKind::Avoid) => {
                self.consume(TokenKind::Avoid)?;
                let child = self.parse_unary()?;
                Ok(Ast::Unary(UnaryOp::Avoid, Box::new(child)))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Ast, Error> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => {
                self.consume(TokenKind::LParen)?;
                let inner = self.parse_or()?;
                self.consume(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::Regex) => {
                let token = self.consume(TokenKind::Regex)?;
                Ok(Ast::Regex(token.value))
            }
            Some(TokenKind::Pieces) => {
                let token = self.consume(TokenKind::Pieces)?;
                Ok(Ast::Pieces(token.value))
            }
            Some(kind) => Err(self.syntax_error(format!("unexpected token {:?}", kind))),
            None => Err(self.syntax_error("reached end of input while expecting an atom".to_string())),
        }
    }
}

//! Tokenizer for the wanted-save expression language.
//!
//! Per the "global regex precompilation" design note, the whole token
//! grammar is a single alternation regex, compiled once into a process-wide
//! static and never mutated afterwards.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Or,
    And,
    Not,
    Avoid,
    LParen,
    RParen,
    Regex,
    Pieces,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

fn master_regex() -> &'static Regex {
    static MASTER: OnceLock<Regex> = OnceLock::new();
    MASTER.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<or>\|\|)",
            r"|(?P<and>&&)",
            r"|(?P<not>!)",
            r"|(?P<avoid>\^)",
            r"|(?P<lparen>\()",
            r"|(?P<rparen>\))",
            r"|(?P<regex>/[^/]+/)",
            r"|(?P<pieces>[TILJSZO]+)",
            r"|(?P<ws>\s+)",
        ))
        .expect("master token regex is a fixed, compile-time-checked pattern")
    })
}

/// Splits `text` into tokens, skipping whitespace.
///
/// # Errors
///
/// Returns [`Error::Syntax`] if `text` contains no tokens at all (empty
/// input, or input made entirely of characters the grammar does not
/// recognize — the latter simply produces zero matches from the
/// alternation regex, same as the original Python tokenizer).
pub fn tokenize(text: &str) -> Result<Vec<Token>, Error> {
    let re = master_regex();
    let mut tokens = Vec::new();

    for caps in re.captures_iter(text) {
        if caps.name("ws").is_some() {
            continue;
        }
        let (kind, raw) = [
            (TokenKind::Or, "or"),
            (TokenKind::And, "and"),
            (TokenKind::Not, "not"),
            (TokenKind::Avoid, "avoid"),
            (TokenKind::LParen, "lparen"),
            (TokenKind::RParen, "rparen"),
            (TokenKind::Regex, "regex"),
            (TokenKind::Pieces, "pieces"),
        ]
        .into_iter()
        .find_map(|(kind, name)| caps.name(name).map(|m| (kind, m.as_str())))
        .expect("capture matched the alternation, so one named group must be set (or it was whitespace)");

        let value = match kind {
            TokenKind::Regex => raw[1..raw.len() - 1].to_string(),
            _ => raw.to_string(),
        };
        tokens.push(Token { kind, value });
    }

    if tokens.is_empty() {
        return Err(Error::Syntax {
            expression: text.to_string(),
            message: "expression could not be tokenized".to_string(),
        });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_basic_expression() {
        let tokens = tokenize("S && !T || (O && !I)").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Pieces,
                TokenKind::And,
                TokenKind::Not,
                TokenKind::Pieces,
                TokenKind::Or,
                TokenKind::LParen,
                TokenKind::Pieces,
                TokenKind::And,
                TokenKind::Not,
                TokenKind::Pieces,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn tokenizes_regex_literal_stripping_slashes() {
        let tokens = tokenize("/T[ISZO]/").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Regex);
        assert_eq!(tokens[0].value, "T[ISZO]");
    }

    #[test]
    fn empty_input_is_a_syntax_error() {
        assert!(tokenize("").is_err());
    }
}

//! DSL tokenizing: quote-aware term splitting and `field op value` decomposition.
//!
//! Quoted literals use single or double quotes and run to the next quote of
//! the same kind. There are no escape sequences; a value containing one kind
//! of quote is written with the other kind (`text="it's"`). A backslash is an
//! ordinary character.

use std::sync::LazyLock;

use regex::Regex;

use super::{Literal, Operator, Term};
use crate::error::ParseError;
use crate::schema::{self, FieldKind};

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?$").expect("valid number regex"));
static NUMERIC_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\.?[0-9]").expect("valid numeric-like regex"));

fn is_quote(ch: char) -> bool {
    ch == '\'' || ch == '"'
}

/// Split a selector into raw terms on whitespace outside quotes.
///
/// ```
/// use sentience_query::split_terms;
///
/// let terms = split_terms(r#"role=button text~'Sign in' name="Log in""#).unwrap();
/// assert_eq!(terms, vec!["role=button", "text~'Sign in'", r#"name="Log in""#]);
/// ```
pub fn split_terms(selector: &str) -> Result<Vec<&str>, ParseError> {
    let mut terms = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, ch) in selector.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch.is_whitespace() => {
                if let Some(s) = start.take() {
                    terms.push(&selector[s..i]);
                }
            }
            None => {
                start.get_or_insert(i);
                if is_quote(ch) {
                    quote = Some(ch);
                }
            }
        }
    }

    if let Some(s) = start {
        if quote.is_some() {
            return Err(ParseError::UnterminatedQuote {
                term: selector[s..].to_string(),
            });
        }
        terms.push(&selector[s..]);
    }
    Ok(terms)
}

/// Right-hand side of a term before typing.
#[derive(Debug, PartialEq)]
enum RawValue<'a> {
    Quoted(&'a str),
    Bare(&'a str),
}

fn raw_value<'a>(value: &'a str, term: &str) -> Result<RawValue<'a>, ParseError> {
    let unexpected = || ParseError::UnexpectedToken {
        token: term.to_string(),
    };

    let Some(first) = value.chars().next() else {
        return Err(unexpected());
    };
    if is_quote(first) {
        let inner = &value[1..];
        return match inner.find(first) {
            Some(end) if end + 1 == inner.len() => Ok(RawValue::Quoted(&inner[..end])),
            Some(_) => Err(unexpected()),
            None => Err(ParseError::UnterminatedQuote {
                term: term.to_string(),
            }),
        };
    }
    if value.contains(is_quote) {
        return Err(unexpected());
    }
    Ok(RawValue::Bare(value))
}

/// Type a bare token by its shape: `true`/`false`, a decimal number, or text.
fn classify_bare(token: &str, term: &str) -> Result<Literal, ParseError> {
    match token {
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        _ => {}
    }
    if !NUMERIC_LIKE.is_match(token) {
        return Ok(Literal::String(token.to_string()));
    }
    let invalid = || ParseError::InvalidNumber {
        token: token.to_string(),
        term: term.to_string(),
    };
    if !NUMBER.is_match(token) {
        return Err(invalid());
    }
    match token.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Literal::Number(n)),
        _ => Err(invalid()),
    }
}

/// Parse one raw term (as returned by [`split_terms`]) into a validated [`Term`].
pub(super) fn parse_term(term: &str) -> Result<Term, ParseError> {
    let field_end = term
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(term.len());
    let (path, rest) = term.split_at(field_end);

    let op = match Operator::match_prefix(rest) {
        Some(op) if !path.is_empty() => op,
        _ => {
            return Err(ParseError::UnexpectedToken {
                token: term.to_string(),
            })
        }
    };

    let spec = schema::lookup(path).ok_or_else(|| ParseError::UnknownField {
        field: path.to_string(),
        term: term.to_string(),
    })?;

    if !spec.kind.supports(op) {
        return Err(ParseError::InvalidOperatorForType {
            field: spec.path.to_string(),
            op,
            kind: spec.kind,
        });
    }

    let literal = match (raw_value(&rest[op.token().len()..], term)?, spec.kind) {
        (RawValue::Quoted(s) | RawValue::Bare(s), FieldKind::String) => {
            Literal::String(s.to_string())
        }
        (RawValue::Quoted(s), _) => Literal::String(s.to_string()),
        (RawValue::Bare(s), _) => classify_bare(s, term)?,
    };

    Term::new(spec, op, literal, term)
}

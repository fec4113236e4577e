//! Structured selector form: `{ "<field><suffix>": literal | [literal, ..] }`.

use serde_json::{Map, Value as Json};

use super::{Literal, Operator, Term};
use crate::error::ParseError;
use crate::schema::{self, FieldKind, FieldSpec};

/// Keys accepted for compatibility with older dict selectors.
const LEGACY_KEYS: &[(&str, &str, Operator)] = &[("role_exclude", "role", Operator::Ne)];

fn split_key(key: &str) -> Option<(&'static FieldSpec, Operator)> {
    if let Some(spec) = schema::lookup(key) {
        return Some((spec, Operator::Eq));
    }
    if let Some((_, path, op)) = LEGACY_KEYS.iter().find(|(k, _, _)| *k == key) {
        return schema::lookup(path).map(|spec| (spec, *op));
    }
    Operator::BY_TOKEN_LENGTH
        .into_iter()
        .filter(|op| !op.suffix().is_empty())
        .find_map(|op| {
            let base = key.strip_suffix(op.suffix())?;
            schema::lookup(base).map(|spec| (spec, op))
        })
}

fn literal_from_json(value: &Json, kind: FieldKind, source: &str) -> Result<Literal, ParseError> {
    let literal = match (value, kind) {
        (Json::String(s), _) => Literal::String(s.clone()),
        (Json::Bool(b), FieldKind::String) => Literal::String(b.to_string()),
        (Json::Bool(b), _) => Literal::Bool(*b),
        (Json::Number(n), FieldKind::String) => Literal::String(n.to_string()),
        (Json::Number(n), _) => match n.as_f64() {
            Some(f) if f.is_finite() => Literal::Number(f),
            _ => {
                return Err(ParseError::InvalidNumber {
                    token: n.to_string(),
                    term: source.to_string(),
                })
            }
        },
        _ => {
            return Err(ParseError::UnexpectedToken {
                token: source.to_string(),
            })
        }
    };
    Ok(literal)
}

pub(super) fn parse_map(map: &Map<String, Json>) -> Result<Vec<Term>, ParseError> {
    let mut terms = Vec::with_capacity(map.len());
    for (key, value) in map {
        let (spec, op) = split_key(key).ok_or_else(|| ParseError::UnknownField {
            field: key.clone(),
            term: format!("{key}={value}"),
        })?;

        let values: &[Json] = match value {
            Json::Array(items) => items,
            single => std::slice::from_ref(single),
        };
        for item in values {
            let source = format!("{key}={item}");
            let literal = literal_from_json(item, spec.kind, &source)?;
            terms.push(Term::new(spec, op, literal, &source)?);
        }
    }
    Ok(terms)
}

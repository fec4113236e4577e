//! Selector language: operators, literals, terms and parsed queries.
//!
//! A selector is either a DSL string such as `role=button text~'Sign in'` or
//! a structured map such as `{"role": "button", "text_contains": "Sign in"}`.
//! Both are validated against [`crate::schema`] and produce the same
//! [`Query`] shape.

mod structured;
mod tokenizer;

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde_json::{Map, Value as Json};

use crate::error::ParseError;
use crate::schema::{FieldKind, FieldSpec};

pub use tokenizer::split_terms;

/// Comparison operator of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    /// Case-insensitive substring.
    Contains,
    /// Case-insensitive prefix.
    Prefix,
    /// Case-insensitive suffix.
    Suffix,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Match order for the DSL: two-character tokens first, so `!=` is never
    /// read as `!` followed by `=`, nor `>=` as `>`.
    pub const BY_TOKEN_LENGTH: [Operator; 9] = [
        Operator::Ne,
        Operator::Gte,
        Operator::Lte,
        Operator::Prefix,
        Operator::Suffix,
        Operator::Contains,
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Contains => "~",
            Operator::Prefix => "^=",
            Operator::Suffix => "$=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }

    /// Key suffix used by the structured selector form.
    pub fn suffix(self) -> &'static str {
        match self {
            Operator::Eq => "",
            Operator::Ne => "_ne",
            Operator::Contains => "_contains",
            Operator::Prefix => "_prefix",
            Operator::Suffix => "_suffix",
            Operator::Gt => "_gt",
            Operator::Gte => "_gte",
            Operator::Lt => "_lt",
            Operator::Lte => "_lte",
        }
    }

    /// The operator `input` starts with, longest token first.
    pub fn match_prefix(input: &str) -> Option<Operator> {
        Self::BY_TOKEN_LENGTH
            .into_iter()
            .find(|op| input.starts_with(op.token()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A typed literal, tagged once at parse time.
///
/// Numbers are always finite and compare by bit pattern so that `Eq` and
/// `Hash` agree across repeated parses of the same selector.
#[derive(Debug, Clone)]
pub enum Literal {
    String(String),
    Bool(bool),
    Number(f64),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Bool(_) => "boolean",
            Literal::Number(_) => "number",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            Literal::String(_) => FieldKind::String,
            Literal::Bool(_) => FieldKind::Bool,
            Literal::Number(_) => FieldKind::Number,
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Literal::String(s) => Json::String(s.clone()),
            Literal::Bool(b) => Json::Bool(*b),
            Literal::Number(n) => Json::from(*n),
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Number(a), Literal::Number(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::String(s) => s.hash(state),
            Literal::Bool(b) => b.hash(state),
            Literal::Number(n) => n.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) if s.contains('\'') => write!(f, "\"{s}\""),
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
        }
    }
}

/// One `field operator literal` condition.
#[derive(Debug, Clone)]
pub struct Term {
    field: &'static FieldSpec,
    op: Operator,
    literal: Literal,
}

impl Term {
    /// Validate operator and literal against the field's declared type.
    ///
    /// `source` is the text the term came from, kept for diagnostics.
    pub(crate) fn new(
        field: &'static FieldSpec,
        op: Operator,
        literal: Literal,
        source: &str,
    ) -> Result<Self, ParseError> {
        if !field.kind.supports(op) {
            return Err(ParseError::InvalidOperatorForType {
                field: field.path.to_string(),
                op,
                kind: field.kind,
            });
        }
        if literal.kind() != field.kind {
            return Err(ParseError::LiteralTypeMismatch {
                field: field.path.to_string(),
                kind: field.kind,
                found: literal.type_name(),
                term: source.to_string(),
            });
        }
        Ok(Self { field, op, literal })
    }

    pub fn field(&self) -> &'static FieldSpec {
        self.field
    }

    pub fn path(&self) -> &'static str {
        self.field.path
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn literal(&self) -> &Literal {
        &self.literal
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.field.path == other.field.path && self.op == other.op && self.literal == other.literal
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.path.hash(state);
        self.op.hash(state);
        self.literal.hash(state);
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field.path, self.op, self.literal)
    }
}

/// A parsed selector: the logical AND of its terms.
///
/// Immutable once built and independent of any snapshot, so one query can be
/// evaluated against many snapshots, from many threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    /// Parse the DSL form.
    ///
    /// ```
    /// use sentience_query::{Operator, Query};
    ///
    /// let q = Query::parse("role=button text~'Sign in'").unwrap();
    /// assert_eq!(q.len(), 2);
    /// assert_eq!(q.terms()[1].op(), Operator::Contains);
    /// assert_eq!(q.to_string(), "role='button' text~'Sign in'");
    /// ```
    pub fn parse(selector: &str) -> Result<Self, ParseError> {
        let terms = split_terms(selector)?
            .into_iter()
            .map(tokenizer::parse_term)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    /// Build from the structured form; keys use the operator suffixes of
    /// [`Operator::suffix`].
    ///
    /// ```
    /// use sentience_query::Query;
    /// use serde_json::json;
    ///
    /// let map = json!({ "role": "button", "importance_gt": 500 });
    /// let q = Query::from_structured(map.as_object().unwrap()).unwrap();
    /// assert_eq!(q, Query::parse("importance>500 role=button").unwrap());
    /// ```
    pub fn from_structured(map: &Map<String, Json>) -> Result<Self, ParseError> {
        structured::parse_map(map).map(|terms| Self { terms })
    }

    /// Render as the structured form. Repeated keys collapse into arrays.
    pub fn to_structured(&self) -> Map<String, Json> {
        let mut map = Map::new();
        for term in &self.terms {
            let key = format!("{}{}", term.path(), term.op().suffix());
            let value = term.literal().to_json();
            match map.get_mut(&key) {
                Some(Json::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Json::Array(vec![first, value]);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }
        map
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// An empty query places no constraint and matches every element.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Copy of this query with the term at `index` dropped.
    pub fn without_term(&self, index: usize) -> Self {
        let terms = self
            .terms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, t)| t.clone())
            .collect();
        Self { terms }
    }
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Any of the accepted selector inputs.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    Dsl(&'a str),
    Structured(&'a Map<String, Json>),
    Parsed(&'a Query),
}

impl<'a> Selector<'a> {
    pub fn to_query(self) -> Result<Cow<'a, Query>, ParseError> {
        match self {
            Selector::Dsl(s) => Query::parse(s).map(Cow::Owned),
            Selector::Structured(map) => Query::from_structured(map).map(Cow::Owned),
            Selector::Parsed(q) => Ok(Cow::Borrowed(q)),
        }
    }
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(s: &'a str) -> Self {
        Selector::Dsl(s)
    }
}

impl<'a> From<&'a String> for Selector<'a> {
    fn from(s: &'a String) -> Self {
        Selector::Dsl(s)
    }
}

impl<'a> From<&'a Map<String, Json>> for Selector<'a> {
    fn from(map: &'a Map<String, Json>) -> Self {
        Selector::Structured(map)
    }
}

impl<'a> From<&'a Query> for Selector<'a> {
    fn from(q: &'a Query) -> Self {
        Selector::Parsed(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(q: &Query) -> u64 {
        let mut h = DefaultHasher::new();
        q.hash(&mut h);
        h.finish()
    }

    #[test]
    fn operators_match_longest_first() {
        assert_eq!(Operator::match_prefix("!=link"), Some(Operator::Ne));
        assert_eq!(Operator::match_prefix(">=500"), Some(Operator::Gte));
        assert_eq!(Operator::match_prefix("<=5"), Some(Operator::Lte));
        assert_eq!(Operator::match_prefix(">5"), Some(Operator::Gt));
        assert_eq!(Operator::match_prefix("=x"), Some(Operator::Eq));
        assert_eq!(Operator::match_prefix("^=Sign"), Some(Operator::Prefix));
        assert_eq!(Operator::match_prefix("$=in"), Some(Operator::Suffix));
        assert_eq!(Operator::match_prefix("~in"), Some(Operator::Contains));
        assert_eq!(Operator::match_prefix("!x"), None);
    }

    #[test]
    fn parse_is_deterministic() {
        let sel = "role=button text~'Sign in' importance>=500 clickable=true";
        let a = Query::parse(sel).unwrap();
        let b = Query::parse(sel).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn display_parses_back_to_the_same_query() {
        let q = Query::parse(r#"text="it's" bbox.x<=12.5 visible!=false role^=menu"#).unwrap();
        assert_eq!(Query::parse(&q.to_string()).unwrap(), q);
    }

    #[test]
    fn structured_round_trip_keeps_repeated_keys() {
        let q = Query::parse("role!=link role!=img importance>10").unwrap();
        let map = q.to_structured();
        assert_eq!(map["role_ne"], serde_json::json!(["link", "img"]));
        let back = Query::from_structured(&map).unwrap();
        assert_eq!(back.len(), 3);
        assert!(back.terms().iter().all(|t| q.terms().contains(t)));
    }

    #[test]
    fn without_term_drops_one() {
        let q = Query::parse("role=button clickable=true").unwrap();
        assert_eq!(q.without_term(0), Query::parse("clickable=true").unwrap());
        assert_eq!(q.without_term(5), q);
    }

    #[test]
    fn empty_selector_is_empty_query() {
        assert!(Query::parse("   ").unwrap().is_empty());
    }
}

//! Term evaluation against resolved values.

use crate::resolve::{resolve, Resolved, Value};
use crate::selector::{Literal, Operator, Query, Term};
use crate::snapshot::{Element, Tier};

/// Apply one term to a resolved value.
///
/// An absent value fails every operator except `!=`: a missing field is "not
/// equal" to any literal. So `field=v` and `field!=v` are complements only
/// where the field is present.
pub fn evaluate(term: &Term, resolved: &Resolved<'_>) -> bool {
    let value = match resolved {
        Resolved::Absent => return term.op() == Operator::Ne,
        Resolved::Present(value) => value,
    };
    let literal = term.literal();

    match term.op() {
        Operator::Eq => equals(value, literal),
        Operator::Ne => !equals(value, literal),
        Operator::Contains => fold_case(value, literal, |hay, needle| hay.contains(needle)),
        Operator::Prefix => fold_case(value, literal, |hay, needle| hay.starts_with(needle)),
        Operator::Suffix => fold_case(value, literal, |hay, needle| hay.ends_with(needle)),
        Operator::Gt => compare(value, literal, |a, b| a > b),
        Operator::Gte => compare(value, literal, |a, b| a >= b),
        Operator::Lt => compare(value, literal, |a, b| a < b),
        Operator::Lte => compare(value, literal, |a, b| a <= b),
    }
}

fn equals(value: &Value<'_>, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::Str(a), Literal::String(b)) => *a == b.as_str(),
        (Value::Bool(a), Literal::Bool(b)) => a == b,
        (Value::Number(a), Literal::Number(b)) => a == b,
        _ => false,
    }
}

fn fold_case(value: &Value<'_>, literal: &Literal, test: impl Fn(&str, &str) -> bool) -> bool {
    match (value, literal) {
        (Value::Str(hay), Literal::String(needle)) => {
            test(hay.to_lowercase().as_str(), needle.to_lowercase().as_str())
        }
        _ => false,
    }
}

fn compare(value: &Value<'_>, literal: &Literal, test: impl Fn(f64, f64) -> bool) -> bool {
    match (value, literal) {
        (Value::Number(a), Literal::Number(b)) => test(*a, *b),
        _ => false,
    }
}

/// Whether `element`, seen through `tier`, satisfies every term of `query`.
pub fn matches(element: &Element, query: &Query, tier: Tier) -> bool {
    query
        .terms()
        .iter()
        .all(|term| evaluate(term, &resolve(element, term.field(), tier)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(sel: &str) -> Term {
        Query::parse(sel).unwrap().terms()[0].clone()
    }

    fn s(v: &str) -> Resolved<'_> {
        Resolved::Present(Value::Str(v))
    }

    fn n(v: f64) -> Resolved<'static> {
        Resolved::Present(Value::Number(v))
    }

    #[test]
    fn string_equality_is_case_sensitive() {
        assert!(evaluate(&term("role=button"), &s("button")));
        assert!(!evaluate(&term("role=button"), &s("Button")));
        assert!(evaluate(&term("role!=button"), &s("Button")));
    }

    #[test]
    fn affix_operators_ignore_case() {
        assert!(evaluate(&term("text~'SIGN'"), &s("Please sign in")));
        assert!(evaluate(&term("text^=please"), &s("Please sign in")));
        assert!(evaluate(&term("text$=IN"), &s("Please sign in")));
        assert!(!evaluate(&term("text^=sign"), &s("Please sign in")));
        assert!(evaluate(&term("text~''"), &s("anything")));
    }

    #[test]
    fn numeric_boundaries() {
        assert!(evaluate(&term("importance>=500"), &n(500.0)));
        assert!(!evaluate(&term("importance>500"), &n(500.0)));
        assert!(evaluate(&term("importance<=500"), &n(500.0)));
        assert!(!evaluate(&term("importance<500"), &n(500.0)));
        assert!(evaluate(&term("importance=500"), &n(500.0)));
        assert!(evaluate(&term("bbox.x>-1.5"), &n(-1.0)));
    }

    #[test]
    fn absent_values() {
        for sel in ["text=x", "text~x", "text^=x", "text$=x"] {
            assert!(!evaluate(&term(sel), &Resolved::Absent), "{sel}");
        }
        assert!(evaluate(&term("text!=x"), &Resolved::Absent));
        assert!(!evaluate(&term("importance>0"), &Resolved::Absent));
    }

    #[test]
    fn booleans() {
        let yes = Resolved::Present(Value::Bool(true));
        assert!(evaluate(&term("clickable=true"), &yes));
        assert!(!evaluate(&term("clickable=false"), &yes));
        assert!(evaluate(&term("clickable!=false"), &yes));
    }
}

//! Filtering and ranking a snapshot by a query.
//!
//! Matches are ordered by tier-masked importance, highest first. Ties keep
//! snapshot order, so results are deterministic even when every importance
//! is masked to zero.

use tracing::debug;

use crate::error::ParseError;
use crate::evaluate::matches;
use crate::resolve::{resolve, Resolved, Value};
use crate::schema::IMPORTANCE;
use crate::selector::{Query, Selector};
use crate::snapshot::{Element, ElementId, Snapshot, Tier};

fn rank_key(element: &Element, tier: Tier) -> f64 {
    match resolve(element, &IMPORTANCE, tier) {
        Resolved::Present(Value::Number(n)) if n.is_nan() => f64::NEG_INFINITY,
        // fold -0.0 into 0.0 so signed zeros tie
        Resolved::Present(Value::Number(n)) if n == 0.0 => 0.0,
        Resolved::Present(Value::Number(n)) => n,
        _ => 0.0,
    }
}

/// Matching elements, best first.
pub fn query_elements<'s>(snapshot: &'s Snapshot, query: &Query) -> Vec<&'s Element> {
    let tier = snapshot.tier;
    let mut ranked: Vec<(f64, &Element)> = snapshot
        .elements
        .iter()
        .filter(|el| matches(el, query, tier))
        .map(|el| (rank_key(el, tier), el))
        .collect();

    // stable: equal keys keep capture order
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    debug!(
        target: "query.engine",
        selector = %query,
        ?tier,
        scanned = snapshot.elements.len(),
        matched = ranked.len(),
        "query evaluated"
    );

    ranked.into_iter().map(|(_, el)| el).collect()
}

/// Identifiers of matching elements, best first.
///
/// ```
/// use sentience_query::{query, Element, ElementId, Query, Snapshot, Tier};
///
/// let snap = Snapshot::new(
///     vec![
///         Element::new(1, "button").with_text("Sign In").with_importance(900.0),
///         Element::new(2, "button").with_text("Sign Up").with_importance(400.0),
///     ],
///     Tier::Elevated,
/// );
/// let q = Query::parse("role=button importance>500").unwrap();
/// assert_eq!(query(&snap, &q), vec![ElementId(1)]);
/// ```
pub fn query(snapshot: &Snapshot, query: &Query) -> Vec<ElementId> {
    query_elements(snapshot, query)
        .into_iter()
        .map(|el| el.id)
        .collect()
}

/// The best match: the head of [`query`], or `None` when nothing matches.
///
/// This is not a first-match scan; the structurally first match in snapshot
/// order is not necessarily the most important one.
pub fn find(snapshot: &Snapshot, q: &Query) -> Option<ElementId> {
    query(snapshot, q).into_iter().next()
}

/// Parse `selector` and run [`query`].
pub fn select<'a>(
    snapshot: &Snapshot,
    selector: impl Into<Selector<'a>>,
) -> Result<Vec<ElementId>, ParseError> {
    let q = selector.into().to_query()?;
    Ok(query(snapshot, &q))
}

/// Parse `selector` and run [`find`].
pub fn select_one<'a>(
    snapshot: &Snapshot,
    selector: impl Into<Selector<'a>>,
) -> Result<Option<ElementId>, ParseError> {
    let q = selector.into().to_query()?;
    Ok(find(snapshot, &q))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_zero_and_nan_rank_deterministically() {
        let snap = Snapshot::new(
            vec![
                Element::new(1, "button").with_importance(f64::NAN),
                Element::new(2, "button").with_importance(-0.0),
                Element::new(3, "button").with_importance(0.0),
            ],
            Tier::Elevated,
        );
        let all = Query::default();
        assert_eq!(
            query(&snap, &all),
            vec![ElementId(2), ElementId(3), ElementId(1)]
        );
    }

    #[test]
    fn select_reports_parse_errors() {
        let snap = Snapshot::new(vec![Element::new(1, "link")], Tier::Free);
        assert!(matches!(
            select(&snap, "nope=1"),
            Err(ParseError::UnknownField { .. })
        ));
        assert_eq!(select(&snap, "role=button").unwrap(), vec![]);
    }
}

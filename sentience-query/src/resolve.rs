//! Field resolution and tier masking.

use std::borrow::Cow;

use crate::schema::{FieldSpec, TierGate, BACKGROUND_COLOR_NAME, IMPORTANCE, IS_PRIMARY};
use crate::snapshot::{Element, Tier};

/// A typed value read out of an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Str(&'a str),
    Bool(bool),
    Number(f64),
}

/// Outcome of resolving a field path on one element.
///
/// `Absent` is distinct from `false`, `0` and the empty string: it means the
/// element carries no value for the field at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Present(Value<'a>),
    Absent,
}

impl<'a> From<Option<&'a str>> for Resolved<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Resolved::Absent, |s| Resolved::Present(Value::Str(s)))
    }
}

impl From<Option<bool>> for Resolved<'_> {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Resolved::Absent, |b| Resolved::Present(Value::Bool(b)))
    }
}

/// Apply tier masking to a raw captured value.
///
/// Gated fields on a free-tier snapshot resolve to the field's neutral value
/// regardless of what was captured; everything else passes through.
pub fn mask<'a>(raw: Resolved<'a>, spec: &FieldSpec, tier: Tier) -> Resolved<'a> {
    match (spec.gate, tier) {
        (TierGate::Gated { neutral }, Tier::Free) => neutral,
        _ => raw,
    }
}

/// Read `spec` from `element` as seen through `tier`.
pub fn resolve<'a>(element: &'a Element, spec: &FieldSpec, tier: Tier) -> Resolved<'a> {
    mask((spec.read)(element), spec, tier)
}

/// The element as `tier` may see it: gated fields carry their masked values.
///
/// Use this before displaying or serializing query results so that output
/// agrees with what the evaluator compared against.
pub fn masked_element(element: &Element, tier: Tier) -> Cow<'_, Element> {
    if tier == Tier::Elevated {
        return Cow::Borrowed(element);
    }
    let mut seen = element.clone();
    seen.importance = match resolve(element, &IMPORTANCE, tier) {
        Resolved::Present(Value::Number(n)) => n,
        _ => 0.0,
    };
    seen.visual_cues.is_primary = matches!(
        resolve(element, &IS_PRIMARY, tier),
        Resolved::Present(Value::Bool(true))
    );
    let colour = resolve(element, &BACKGROUND_COLOR_NAME, tier);
    seen.visual_cues.background_color_name = match colour {
        Resolved::Present(Value::Str(s)) => Some(s.to_owned()),
        _ => None,
    };
    Cow::Owned(seen)
}

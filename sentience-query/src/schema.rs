//! The closed set of queryable element fields.
//!
//! Each entry maps a dotted path to its declared type, its tier-gating rule
//! and an accessor. The parser, resolver and evaluator all consult this one
//! table, so adding a field means adding a row here.

use std::fmt;

use crate::resolve::{Resolved, Value};
use crate::selector::Operator;
use crate::snapshot::Element;

/// Bumped whenever a row is added, removed or retyped.
pub const SCHEMA_VERSION: u32 = 1;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Bool,
    Number,
}

impl FieldKind {
    /// Operators that may be applied to a field of this kind.
    pub fn supports(self, op: Operator) -> bool {
        use Operator::*;
        match self {
            FieldKind::String => matches!(op, Eq | Ne | Contains | Prefix | Suffix),
            FieldKind::Bool => matches!(op, Eq | Ne),
            FieldKind::Number => matches!(op, Eq | Ne | Gt | Gte | Lt | Lte),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::String => "string",
            FieldKind::Bool => "boolean",
            FieldKind::Number => "number",
        })
    }
}

/// Whether a field reveals its captured value on free-tier snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierGate {
    Open,
    /// Free tier always sees `neutral`, whatever was captured.
    Gated { neutral: Resolved<'static> },
}

/// One row of the field table.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub path: &'static str,
    pub kind: FieldKind,
    pub gate: TierGate,
    pub read: fn(&Element) -> Resolved<'_>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("gate", &self.gate)
            .finish()
    }
}

const NEUTRAL_NUMBER: TierGate = TierGate::Gated {
    neutral: Resolved::Present(Value::Number(0.0)),
};
const NEUTRAL_BOOL: TierGate = TierGate::Gated {
    neutral: Resolved::Present(Value::Bool(false)),
};
const NEUTRAL_NULL: TierGate = TierGate::Gated {
    neutral: Resolved::Absent,
};

fn role(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Str(&el.role))
}
fn text(el: &Element) -> Resolved<'_> {
    el.text.as_deref().into()
}
fn name(el: &Element) -> Resolved<'_> {
    el.name.as_deref().into()
}
fn clickable(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Bool(el.visual_cues.is_clickable))
}
fn visible(el: &Element) -> Resolved<'_> {
    el.visible.into()
}
fn importance(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Number(el.importance))
}
fn bbox_x(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Number(el.bbox.x))
}
fn bbox_y(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Number(el.bbox.y))
}
fn bbox_width(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Number(el.bbox.width))
}
fn bbox_height(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Number(el.bbox.height))
}
fn in_viewport(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Bool(el.in_viewport))
}
fn is_occluded(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Bool(el.is_occluded))
}
fn z_index(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Number(el.z_index))
}
fn is_primary(el: &Element) -> Resolved<'_> {
    Resolved::Present(Value::Bool(el.visual_cues.is_primary))
}
fn background_color_name(el: &Element) -> Resolved<'_> {
    el.visual_cues.background_color_name.as_deref().into()
}

const fn row(
    path: &'static str,
    kind: FieldKind,
    gate: TierGate,
    read: fn(&Element) -> Resolved<'_>,
) -> FieldSpec {
    FieldSpec {
        path,
        kind,
        gate,
        read,
    }
}

/// The field results are ranked by.
pub static IMPORTANCE: FieldSpec = row("importance", FieldKind::Number, NEUTRAL_NUMBER, importance);
pub static IS_PRIMARY: FieldSpec =
    row("visual_cues.is_primary", FieldKind::Bool, NEUTRAL_BOOL, is_primary);
pub static BACKGROUND_COLOR_NAME: FieldSpec = row(
    "visual_cues.background_color_name",
    FieldKind::String,
    NEUTRAL_NULL,
    background_color_name,
);

static ROLE: FieldSpec = row("role", FieldKind::String, TierGate::Open, role);
static TEXT: FieldSpec = row("text", FieldKind::String, TierGate::Open, text);
static NAME: FieldSpec = row("name", FieldKind::String, TierGate::Open, name);
static CLICKABLE: FieldSpec = row("clickable", FieldKind::Bool, TierGate::Open, clickable);
static VISIBLE: FieldSpec = row("visible", FieldKind::Bool, TierGate::Open, visible);
static BBOX_X: FieldSpec = row("bbox.x", FieldKind::Number, TierGate::Open, bbox_x);
static BBOX_Y: FieldSpec = row("bbox.y", FieldKind::Number, TierGate::Open, bbox_y);
static BBOX_WIDTH: FieldSpec = row("bbox.width", FieldKind::Number, TierGate::Open, bbox_width);
static BBOX_HEIGHT: FieldSpec = row("bbox.height", FieldKind::Number, TierGate::Open, bbox_height);
static IN_VIEWPORT: FieldSpec = row("in_viewport", FieldKind::Bool, TierGate::Open, in_viewport);
static IS_OCCLUDED: FieldSpec = row("is_occluded", FieldKind::Bool, TierGate::Open, is_occluded);
static Z_INDEX: FieldSpec = row("z_index", FieldKind::Number, TierGate::Open, z_index);

static FIELDS: &[&FieldSpec] = &[
    &ROLE,
    &TEXT,
    &NAME,
    &CLICKABLE,
    &VISIBLE,
    &IMPORTANCE,
    &BBOX_X,
    &BBOX_Y,
    &BBOX_WIDTH,
    &BBOX_HEIGHT,
    &IN_VIEWPORT,
    &IS_OCCLUDED,
    &Z_INDEX,
    &IS_PRIMARY,
    &BACKGROUND_COLOR_NAME,
];

/// Look up a field by its dotted path. Paths are case-sensitive.
pub fn lookup(path: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().copied().find(|spec| spec.path == path)
}

/// All known fields in table order.
pub fn known_fields() -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().copied()
}

//! Element records and snapshots as emitted by the in-page extension.
//!
//! A [`Snapshot`] is produced once by the capture layer and never mutated by
//! the query engine. Element order is capture order and is used as the stable
//! tie-break when ranking matches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque element identifier, stable within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualCues {
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub background_color_name: Option<String>,
    #[serde(default)]
    pub is_clickable: bool,
}

fn default_in_viewport() -> bool {
    true
}

/// One captured page element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub role: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Accessible name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub importance: f64,
    #[serde(default)]
    pub bbox: BBox,
    #[serde(default)]
    pub visual_cues: VisualCues,
    /// Assumed visible on screen unless the capture says otherwise.
    #[serde(default = "default_in_viewport")]
    pub in_viewport: bool,
    #[serde(default)]
    pub is_occluded: bool,
    #[serde(default)]
    pub z_index: f64,
    #[serde(default)]
    pub visible: Option<bool>,
}

impl Element {
    /// Minimal element, mostly useful for tests and fixtures.
    pub fn new(id: u64, role: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            role: role.into(),
            text: None,
            name: None,
            importance: 0.0,
            bbox: BBox::default(),
            visual_cues: VisualCues::default(),
            in_viewport: true,
            is_occluded: false,
            z_index: 0.0,
            visible: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = BBox {
            x,
            y,
            width,
            height,
        };
        self
    }

    pub fn with_visual_cues(mut self, cues: VisualCues) -> Self {
        self.visual_cues = cues;
        self
    }

    pub fn clickable(mut self, clickable: bool) -> Self {
        self.visual_cues.is_clickable = clickable;
        self
    }
}

/// Privilege level of the snapshot's origin. Free-tier snapshots have their
/// proprietary fields masked at evaluation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Elevated,
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "elevated" | "pro" | "enterprise" => Ok(Self::Elevated),
            other => Err(format!("unknown tier `{other}` (expected free or elevated)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

fn default_status() -> String {
    "success".into()
}

/// An immutable capture of page elements plus the tier marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    /// Base64 data URL when the capture requested a screenshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Snapshot {
    pub fn new(elements: Vec<Element>, tier: Tier) -> Self {
        Self {
            status: default_status(),
            url: None,
            elements,
            tier,
            viewport: None,
            screenshot: None,
            error: None,
        }
    }

    /// Deserialize the JSON object returned by `window.sentience.snapshot()`.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }

    /// Resolve an identifier returned by the engine back to its record.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }
}

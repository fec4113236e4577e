//! Change detection between two snapshots of the same page.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::snapshot::{Element, ElementId, Snapshot};

/// Default movement threshold in pixels.
pub const BBOX_CHANGE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    Moved,
}

/// An element paired with how it changed. `status` is `None` for unchanged
/// elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDiff<'a> {
    pub element: &'a Element,
    pub status: Option<DiffStatus>,
}

pub struct SnapshotDiff;

impl SnapshotDiff {
    /// Diff `current` against `previous` with the default threshold.
    pub fn compute<'a>(
        current: &'a Snapshot,
        previous: Option<&'a Snapshot>,
    ) -> Vec<ElementDiff<'a>> {
        Self::compute_with_threshold(current, previous, BBOX_CHANGE_THRESHOLD)
    }

    /// Current elements come first in capture order, followed by elements
    /// that disappeared, in their previous capture order.
    pub fn compute_with_threshold<'a>(
        current: &'a Snapshot,
        previous: Option<&'a Snapshot>,
        threshold: f64,
    ) -> Vec<ElementDiff<'a>> {
        let Some(previous) = previous else {
            return current
                .elements
                .iter()
                .map(|element| ElementDiff {
                    element,
                    status: Some(DiffStatus::Added),
                })
                .collect();
        };

        let previous_by_id: HashMap<ElementId, &Element> =
            previous.elements.iter().map(|el| (el.id, el)).collect();
        let current_ids: HashSet<ElementId> = current.elements.iter().map(|el| el.id).collect();

        let mut out: Vec<ElementDiff<'a>> = current
            .elements
            .iter()
            .map(|element| {
                let status = match previous_by_id.get(&element.id) {
                    None => Some(DiffStatus::Added),
                    Some(before) => classify(element, before, threshold),
                };
                ElementDiff { element, status }
            })
            .collect();

        out.extend(
            previous
                .elements
                .iter()
                .filter(|el| !current_ids.contains(&el.id))
                .map(|element| ElementDiff {
                    element,
                    status: Some(DiffStatus::Removed),
                }),
        );
        out
    }
}

fn classify(now: &Element, before: &Element, threshold: f64) -> Option<DiffStatus> {
    match (bbox_changed(now, before, threshold), content_changed(now, before)) {
        (_, true) => Some(DiffStatus::Modified),
        (true, false) => Some(DiffStatus::Moved),
        (false, false) => None,
    }
}

fn bbox_changed(a: &Element, b: &Element, threshold: f64) -> bool {
    (a.bbox.x - b.bbox.x).abs() > threshold
        || (a.bbox.y - b.bbox.y).abs() > threshold
        || (a.bbox.width - b.bbox.width).abs() > threshold
        || (a.bbox.height - b.bbox.height).abs() > threshold
}

fn content_changed(a: &Element, b: &Element) -> bool {
    a.text != b.text
        || a.role != b.role
        || a.visual_cues.is_primary != b.visual_cues.is_primary
        || a.visual_cues.is_clickable != b.visual_cues.is_clickable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Tier;

    fn statuses(diff: &[ElementDiff<'_>]) -> Vec<(u64, Option<DiffStatus>)> {
        diff.iter().map(|d| (d.element.id.0, d.status)).collect()
    }

    #[test]
    fn first_snapshot_is_all_added() {
        let cur = Snapshot::new(
            vec![Element::new(1, "link"), Element::new(2, "button")],
            Tier::Free,
        );
        assert_eq!(
            statuses(&SnapshotDiff::compute(&cur, None)),
            vec![(1, Some(DiffStatus::Added)), (2, Some(DiffStatus::Added))]
        );
    }

    #[test]
    fn classifies_changes() {
        let prev = Snapshot::new(
            vec![
                Element::new(1, "button").with_text("Save").with_bbox(0.0, 0.0, 80.0, 30.0),
                Element::new(2, "link").with_text("Home").with_bbox(0.0, 40.0, 60.0, 20.0),
                Element::new(3, "link").with_text("About").with_bbox(0.0, 70.0, 60.0, 20.0),
                Element::new(4, "img"),
                Element::new(5, "textbox").with_bbox(10.0, 10.0, 200.0, 30.0),
            ],
            Tier::Free,
        );
        let cur = Snapshot::new(
            vec![
                // nudged below the threshold
                Element::new(1, "button").with_text("Save").with_bbox(4.0, 0.0, 80.0, 30.0),
                // moved only
                Element::new(2, "link").with_text("Home").with_bbox(0.0, 140.0, 60.0, 20.0),
                // text changed
                Element::new(3, "link").with_text("About us").with_bbox(0.0, 70.0, 60.0, 20.0),
                // moved and restyled
                Element::new(5, "textbox").clickable(true).with_bbox(10.0, 50.0, 200.0, 30.0),
                Element::new(6, "button"),
            ],
            Tier::Free,
        );

        assert_eq!(
            statuses(&SnapshotDiff::compute(&cur, Some(&prev))),
            vec![
                (1, None),
                (2, Some(DiffStatus::Moved)),
                (3, Some(DiffStatus::Modified)),
                (5, Some(DiffStatus::Modified)),
                (6, Some(DiffStatus::Added)),
                (4, Some(DiffStatus::Removed)),
            ]
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        let link_at = |x| Element::new(1, "link").with_bbox(x, 0.0, 10.0, 10.0);
        let prev = Snapshot::new(vec![link_at(0.0)], Tier::Free);
        let cur = Snapshot::new(vec![link_at(5.0)], Tier::Free);
        assert_eq!(statuses(&SnapshotDiff::compute(&cur, Some(&prev))), vec![(1, None)]);
        assert_eq!(
            statuses(&SnapshotDiff::compute_with_threshold(&cur, Some(&prev), 1.0)),
            vec![(1, Some(DiffStatus::Moved))]
        );
    }
}

//! Translation of renderer selection and palette changes into host events.

use scatterview_core::{LegendEntry, SharedRow, to_json_safe};
use scatterview_events::Event;
use scatterview_pipeline::{ClusterPalette, PaletteKey, Projection};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// In-range indices in first-seen order, duplicates removed.
pub fn normalize_indices(indices: &[usize], valid_count: usize) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(indices.len());
    indices
        .iter()
        .copied()
        .filter(|&index| index < valid_count && seen.insert(index))
        .collect()
}

fn row_payload(row: &SharedRow) -> Value {
    to_json_safe(&Value::Object(row.as_ref().clone()))
}

/// Host events for a renderer `select`: the full selection, then the
/// single-point channel (`None` unless exactly one row is selected).
pub fn selection_events(indices: &[usize], valid_rows: &[SharedRow]) -> [Event; 2] {
    let rows: Vec<Value> = normalize_indices(indices, valid_rows.len())
        .into_iter()
        .filter_map(|index| valid_rows.get(index))
        .map(row_payload)
        .collect();
    let single = match rows.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    };
    [
        Event::SelectedPoints { rows },
        Event::SelectedPoint { row: single },
    ]
}

/// Host events for a renderer `deselect`.
pub fn deselection_events() -> [Event; 2] {
    [
        Event::SelectedPoints { rows: Vec::new() },
        Event::SelectedPoint { row: None },
    ]
}

/// Renderer call needed to select a cluster by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterSelection {
    /// Blank name; nothing to do.
    Ignore,
    Deselect,
    Select(Vec<usize>),
}

pub fn cluster_selection(name: &str, palette: &ClusterPalette, projection: &Projection) -> ClusterSelection {
    let name = name.trim();
    if name.is_empty() {
        return ClusterSelection::Ignore;
    }
    match projection.indices_for_label(palette, name) {
        [] => ClusterSelection::Deselect,
        indices => ClusterSelection::Select(indices.to_vec()),
    }
}

/// Gate for pushing palette colors to the renderer.
#[derive(Debug, Default)]
pub struct PaletteTracker {
    last: Option<PaletteKey>,
}

impl PaletteTracker {
    /// `true` when `key` differs from the last pushed key; records it.
    pub fn changed(&mut self, key: PaletteKey) -> bool {
        if self.last.as_ref() == Some(&key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendKey {
    pub palette: PaletteKey,
    pub summary: Vec<(String, usize)>,
}

impl LegendKey {
    pub fn new(palette: PaletteKey, entries: &[LegendEntry]) -> Self {
        Self {
            palette,
            summary: entries.iter().map(|e| (e.name.clone(), e.count)).collect(),
        }
    }
}

/// Change detection for `clusters-changed`.
#[derive(Debug, Default)]
pub struct LegendTracker {
    last_key: Option<LegendKey>,
    last_entries: Vec<LegendEntry>,
}

impl LegendTracker {
    /// Entries to publish, or `None` when the legend is unchanged.
    ///
    /// An empty legend never replaces a non-empty one.
    pub fn update(&mut self, key: LegendKey, entries: &[LegendEntry]) -> Option<Vec<LegendEntry>> {
        if entries.is_empty() && !self.last_entries.is_empty() {
            return None;
        }
        if self.last_key.as_ref() == Some(&key) {
            return None;
        }
        self.last_key = Some(key);
        self.last_entries = entries.to_vec();
        Some(self.last_entries.clone())
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.last_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatterview_core::EffectiveKeys;
    use scatterview_pipeline::project_rows;
    use serde_json::json;
    use std::sync::Arc;

    fn rows(values: Vec<Value>) -> Vec<SharedRow> {
        values
            .into_iter()
            .map(|v| Arc::new(v.as_object().cloned().unwrap()))
            .collect()
    }

    fn entry(name: &str, count: usize) -> LegendEntry {
        LegendEntry {
            name: name.into(),
            color: "#000000".into(),
            count,
        }
    }

    fn palette_key(labels: &[&str]) -> PaletteKey {
        PaletteKey {
            cluster_key: "c".into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            row_count: 3,
        }
    }

    #[test]
    fn test_normalize_drops_duplicates_and_out_of_range() {
        assert_eq!(normalize_indices(&[2, 0, 2, 9, 1], 3), vec![2, 0, 1]);
    }

    #[test]
    fn test_single_selection_fills_both_channels() {
        let rows = rows(vec![json!({"id": 1}), json!({"id": 9_007_199_254_740_993_u64})]);
        let [points, point] = selection_events(&[1], &rows);
        assert_eq!(
            points,
            Event::SelectedPoints {
                rows: vec![json!({"id": "9007199254740993"})]
            }
        );
        assert_eq!(
            point,
            Event::SelectedPoint {
                row: Some(json!({"id": "9007199254740993"}))
            }
        );
    }

    #[test]
    fn test_multi_selection_clears_single_channel() {
        let rows = rows(vec![json!({"id": 1}), json!({"id": 2})]);
        let [points, point] = selection_events(&[0, 1], &rows);
        assert_eq!(
            points,
            Event::SelectedPoints {
                rows: vec![json!({"id": 1}), json!({"id": 2})]
            }
        );
        assert_eq!(point, Event::SelectedPoint { row: None });
    }

    #[test]
    fn test_deselection_empties_both_channels() {
        let [points, point] = deselection_events();
        assert_eq!(points, Event::SelectedPoints { rows: vec![] });
        assert_eq!(point, Event::SelectedPoint { row: None });
    }

    #[test]
    fn test_cluster_selection() {
        let rows = rows(vec![
            json!({"x": 0, "y": 0, "c": "a"}),
            json!({"x": 1, "y": "bad", "c": "b"}),
            json!({"x": 2, "y": 2, "c": "a"}),
        ]);
        let palette = ClusterPalette::build(&rows, "c");
        let keys = EffectiveKeys {
            x_key: "x".into(),
            y_key: "y".into(),
            cluster_key: "c".into(),
        };
        let projection = project_rows(&rows, &keys, &palette);

        assert_eq!(
            cluster_selection(" a ", &palette, &projection),
            ClusterSelection::Select(vec![0, 1])
        );
        assert_eq!(cluster_selection("b", &palette, &projection), ClusterSelection::Deselect);
        assert_eq!(cluster_selection("foo", &palette, &projection), ClusterSelection::Deselect);
        assert_eq!(cluster_selection("  ", &palette, &projection), ClusterSelection::Ignore);
    }

    #[test]
    fn test_palette_tracker_gates_repeats() {
        let mut tracker = PaletteTracker::default();
        assert!(tracker.changed(palette_key(&["a", "b"])));
        assert!(!tracker.changed(palette_key(&["a", "b"])));
        assert!(tracker.changed(palette_key(&["a", "z"])));
        tracker.reset();
        assert!(tracker.changed(palette_key(&["a", "z"])));
    }

    #[test]
    fn test_legend_tracker_emits_once_per_change() {
        let mut tracker = LegendTracker::default();
        let entries = vec![entry("a", 2), entry("b", 0)];
        let key = LegendKey::new(palette_key(&["a", "b"]), &entries);

        assert_eq!(tracker.update(key.clone(), &entries), Some(entries.clone()));
        assert_eq!(tracker.update(key, &entries), None);

        let recount = vec![entry("a", 1), entry("b", 1)];
        let key = LegendKey::new(palette_key(&["a", "b"]), &recount);
        assert_eq!(tracker.update(key, &recount), Some(recount.clone()));
        assert_eq!(tracker.entries(), recount.as_slice());
    }

    #[test]
    fn test_legend_tracker_keeps_previous_over_empty() {
        let mut tracker = LegendTracker::default();
        let entries = vec![entry("a", 2)];
        tracker.update(LegendKey::new(palette_key(&["a"]), &entries), &entries);

        let empty = LegendKey::new(palette_key(&[]), &[]);
        assert_eq!(tracker.update(empty, &[]), None);
        assert_eq!(tracker.entries(), entries.as_slice());
    }
}

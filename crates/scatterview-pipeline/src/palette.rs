//! Cluster palette system
//!
//! Chooses the cluster field, collects the ordered label set and maps every
//! label to a palette slot with a deterministic color.

use scatterview_core::{FALLBACK_CLUSTER_LABEL, SharedRow, cluster_label};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Cluster field used when nothing else is configured.
pub const DEFAULT_CLUSTER_FIELD: &str = "cluster_id";

/// Well-known cluster columns, tried after the requested field.
pub const CLUSTER_CANDIDATES: [&str; 10] = [
    "cluster",
    "cluster_id",
    "clusterId",
    "label",
    "topic",
    "topic_id",
    "group",
    "group_id",
    "category",
    "category_id",
];

/// Rows sampled when scoring cluster candidates.
pub const CLUSTER_SAMPLE_LIMIT: usize = 2000;

pub const PALETTE_SATURATION: f64 = 0.55;
pub const PALETTE_VALUE: f64 = 0.95;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color from HSV components, each in `[0, 1]`.
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        let (r, g, b) = hsv_to_rgb(h, s, v);
        Self::rgb(channel(r), channel(g), channel(b))
    }

    /// `#rrggbb`, lowercase.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn channel(unit: f64) -> u8 {
    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert HSV to RGB.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h.floor() as i32;
    let f = h - f64::from(i);
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match i % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// One evenly spaced hue per label, in label order.
pub fn palette_colors(count: usize) -> Vec<Color> {
    (0..count)
        .map(|index| {
            let hue = if count <= 1 {
                0.0
            } else {
                index as f64 / count as f64
            };
            Color::from_hsv(hue, PALETTE_SATURATION, PALETTE_VALUE)
        })
        .collect()
}

/// Pick the cluster field with the most usable values.
///
/// The requested field is scored first and only a strictly higher count
/// displaces the running best, so earlier candidates win ties. When no
/// candidate has any usable value the requested field is returned.
pub fn choose_best_cluster_key(rows: &[SharedRow], requested: &str) -> String {
    let requested = match requested.trim() {
        "" => DEFAULT_CLUSTER_FIELD,
        trimmed => trimmed,
    };

    let mut candidates: Vec<&str> = Vec::with_capacity(CLUSTER_CANDIDATES.len() + 1);
    for key in std::iter::once(requested).chain(CLUSTER_CANDIDATES) {
        if !candidates.contains(&key) {
            candidates.push(key);
        }
    }

    let sample = &rows[..rows.len().min(CLUSTER_SAMPLE_LIMIT)];
    let usable = |key: &str| {
        sample
            .iter()
            .filter(|row| cluster_label(row.get(key)).is_some())
            .count()
    };

    let mut best = requested;
    let mut best_count = usable(requested);
    for key in candidates.into_iter().skip(1) {
        let count = usable(key);
        if count > best_count {
            best = key;
            best_count = count;
        }
    }
    best.to_string()
}

/// Unique usable labels of `cluster_key` across all rows, first-seen order.
///
/// Never empty: a dataset without usable labels gets the single label `"0"`.
pub fn collect_labels(rows: &[SharedRow], cluster_key: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut labels = Vec::new();
    for row in rows {
        if let Some(label) = cluster_label(row.get(cluster_key)) {
            if seen.insert(label.clone()) {
                labels.push(label);
            }
        }
    }
    if labels.is_empty() {
        labels.push(FALLBACK_CLUSTER_LABEL.to_string());
    }
    labels
}

/// Change-detection key for pushing colors to the renderer.
///
/// Carries the full label sequence, so swapping labels at equal counts still
/// registers as a change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaletteKey {
    pub cluster_key: String,
    pub labels: Vec<String>,
    pub row_count: usize,
}

/// Ordered labels with their colors and palette indices.
#[derive(Debug, Clone)]
pub struct ClusterPalette {
    cluster_key: String,
    labels: Vec<String>,
    colors: Vec<Color>,
    index: HashMap<String, usize>,
    row_count: usize,
}

impl ClusterPalette {
    pub fn build(rows: &[SharedRow], requested_field: &str) -> Self {
        let cluster_key = choose_best_cluster_key(rows, requested_field);
        let labels = collect_labels(rows, &cluster_key);
        Self::from_labels(cluster_key, labels, rows.len())
    }

    pub fn from_labels(cluster_key: String, labels: Vec<String>, row_count: usize) -> Self {
        let labels = if labels.is_empty() {
            vec![FALLBACK_CLUSTER_LABEL.to_string()]
        } else {
            labels
        };
        let colors = palette_colors(labels.len());
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();
        Self {
            cluster_key,
            labels,
            colors,
            index,
            row_count,
        }
    }

    pub fn cluster_key(&self) -> &str {
        &self.cluster_key
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn hex_colors(&self) -> Vec<String> {
        self.colors.iter().map(Color::to_hex).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Label given to rows whose cluster value is unusable.
    pub fn fallback_label(&self) -> &str {
        self.labels
            .first()
            .map_or(FALLBACK_CLUSTER_LABEL, String::as_str)
    }

    pub fn key(&self) -> PaletteKey {
        PaletteKey {
            cluster_key: self.cluster_key.clone(),
            labels: self.labels.clone(),
            row_count: self.row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn rows(values: Vec<serde_json::Value>) -> Vec<SharedRow> {
        values
            .into_iter()
            .map(|v| Arc::new(v.as_object().cloned().unwrap()))
            .collect()
    }

    #[test]
    fn test_hsv_primary_hues() {
        assert_eq!(Color::from_hsv(0.0, 1.0, 1.0).to_hex(), "#ff0000");
        assert_eq!(Color::from_hsv(1.0 / 3.0, 1.0, 1.0).to_hex(), "#00ff00");
        assert_eq!(Color::from_hsv(2.0 / 3.0, 1.0, 1.0).to_hex(), "#0000ff");
        assert_eq!(Color::from_hsv(0.5, 0.0, 0.5).to_hex(), "#808080");
    }

    #[test]
    fn test_palette_colors_are_deterministic_and_distinct() {
        let colors = palette_colors(4);
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[0].to_hex(), "#f26d6d");
        assert_eq!(colors, palette_colors(4));
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_single_label_uses_hue_zero() {
        assert_eq!(palette_colors(1), vec![Color::from_hsv(0.0, 0.55, 0.95)]);
        assert!(palette_colors(0).is_empty());
    }

    #[test]
    fn test_requested_field_absent_resolves_to_discovered_candidate() {
        let rows = rows(vec![
            json!({"x": 1, "y": 1, "cluster_id": "a"}),
            json!({"x": 2, "y": 2, "cluster_id": "b"}),
        ]);
        assert_eq!(choose_best_cluster_key(&rows, "topic"), "cluster_id");
    }

    #[test]
    fn test_requested_field_wins_ties() {
        let rows = rows(vec![json!({"mine": "a", "cluster": "b"})]);
        assert_eq!(choose_best_cluster_key(&rows, "mine"), "mine");
    }

    #[test]
    fn test_earlier_candidate_wins_ties() {
        let rows = rows(vec![json!({"group": "a", "label": "b"})]);
        assert_eq!(choose_best_cluster_key(&rows, "nope"), "label");
    }

    #[test]
    fn test_higher_count_beats_requested_field() {
        let rows = rows(vec![
            json!({"topic": "t", "category": "a"}),
            json!({"topic": " ", "category": "b"}),
            json!({"topic": null, "category": "c"}),
        ]);
        assert_eq!(choose_best_cluster_key(&rows, "topic"), "category");
    }

    #[test]
    fn test_no_usable_values_falls_back_to_requested() {
        let rows = rows(vec![json!({"x": 1})]);
        assert_eq!(choose_best_cluster_key(&rows, "topic"), "topic");
        assert_eq!(choose_best_cluster_key(&rows, "  "), DEFAULT_CLUSTER_FIELD);
    }

    #[test]
    fn test_collect_labels_first_seen_order() {
        let rows = rows(vec![
            json!({"c": "b"}),
            json!({"c": 1}),
            json!({"c": "b"}),
            json!({"c": ""}),
            json!({"c": "a"}),
        ]);
        assert_eq!(collect_labels(&rows, "c"), vec!["b", "1", "a"]);
        assert_eq!(collect_labels(&rows, "missing"), vec!["0"]);
    }

    #[test]
    fn test_palette_indices_follow_label_order() {
        let palette =
            ClusterPalette::from_labels("c".into(), vec!["b".into(), "a".into()], 3);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.colors().len(), 2);
        assert_eq!(palette.index_of("b"), Some(0));
        assert_eq!(palette.index_of("a"), Some(1));
        assert_eq!(palette.index_of("z"), None);
        assert_eq!(palette.fallback_label(), "b");
    }

    #[test]
    fn test_palette_key_tracks_label_identity() {
        let a = ClusterPalette::from_labels("c".into(), vec!["a".into(), "b".into()], 2);
        let b = ClusterPalette::from_labels("c".into(), vec!["a".into(), "z".into()], 2);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
    }
}

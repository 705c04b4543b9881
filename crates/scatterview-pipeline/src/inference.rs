//! Coordinate column inference.
//!
//! Rows arrive with whatever column names the upstream projection tool
//! chose. Inference picks the best-ranked `(x, y)` pair that is actually
//! present, and effective-key resolution decides whether a user override
//! beats the inferred pair.

use scatterview_core::{FALLBACK_X_KEY, FALLBACK_Y_KEY, Row, SharedRow, has_field};

/// Ranked x candidates, best first.
pub const X_CANDIDATES: [&str; 6] = ["x", "projection_x", "umap_x", "tsne_x", "pca_x", "x0"];

/// Ranked y candidates, best first.
pub const Y_CANDIDATES: [&str; 6] = ["y", "projection_y", "umap_y", "tsne_y", "pca_y", "y0"];

/// Rows scanned when the first row lacks a full pair.
pub const AXIS_SCAN_LIMIT: usize = 25;

/// Cached result of axis inference for one row set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisInference {
    /// `None` only when there were no rows to look at.
    pub pair: Option<(String, String)>,
}

impl AxisInference {
    pub fn from_rows(rows: &[SharedRow]) -> Self {
        Self {
            pair: infer_axes(rows),
        }
    }

    pub fn x_key(&self) -> &str {
        self.pair.as_ref().map_or(FALLBACK_X_KEY, |(x, _)| x.as_str())
    }

    pub fn y_key(&self) -> &str {
        self.pair.as_ref().map_or(FALLBACK_Y_KEY, |(_, y)| y.as_str())
    }
}

fn first_present<'a>(row: &Row, candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|key| has_field(row, key))
}

fn full_pair(row: &Row) -> Option<(String, String)> {
    let x = first_present(row, &X_CANDIDATES)?;
    let y = first_present(row, &Y_CANDIDATES)?;
    Some((x.to_string(), y.to_string()))
}

/// Infer the coordinate keys for a row set.
///
/// Returns `None` for an empty row set. Otherwise the first row with both an
/// x and a y candidate (within [`AXIS_SCAN_LIMIT`]) wins, and the literal
/// `"x"`/`"y"` pair is the fallback.
pub fn infer_axes(rows: &[SharedRow]) -> Option<(String, String)> {
    if rows.is_empty() {
        return None;
    }
    let pair = rows
        .iter()
        .take(AXIS_SCAN_LIMIT)
        .find_map(|row| full_pair(row))
        .unwrap_or_else(|| (FALLBACK_X_KEY.to_string(), FALLBACK_Y_KEY.to_string()));
    Some(pair)
}

/// Resolve one effective key.
///
/// An override is honored only when it is non-blank and an own field of the
/// first row; otherwise `inferred` is used.
pub fn resolve_key(override_key: Option<&str>, first_row: Option<&Row>, inferred: &str) -> String {
    match (override_key, first_row) {
        (Some(key), Some(row)) if !key.trim().is_empty() && has_field(row, key) => {
            key.to_string()
        }
        _ => inferred.to_string(),
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
    fn test_empty_rows_infer_nothing() {
        let inference = AxisInference::from_rows(&[]);
        assert_eq!(inference.pair, None);
        assert_eq!(inference.x_key(), "x");
        assert_eq!(inference.y_key(), "y");
    }

    #[test]
    fn test_first_row_pair_wins() {
        let rows = rows(vec![json!({"umap_x": 1, "umap_y": 2, "x": 0, "pca_y": 1})]);
        assert_eq!(
            infer_axes(&rows),
            Some(("x".to_string(), "umap_y".to_string()))
        );
    }

    #[test]
    fn test_scan_finds_later_row_with_full_pair() {
        let rows = rows(vec![
            json!({"tsne_x": 1}),
            json!({"label": "a"}),
            json!({"tsne_x": 1, "tsne_y": 2}),
        ]);
        assert_eq!(
            infer_axes(&rows),
            Some(("tsne_x".to_string(), "tsne_y".to_string()))
        );
    }

    #[test]
    fn test_scan_stops_at_limit() {
        let mut values = vec![json!({"foo": 1}); AXIS_SCAN_LIMIT];
        values.push(json!({"umap_x": 1, "umap_y": 2}));
        let rows = rows(values);
        assert_eq!(infer_axes(&rows), Some(("x".to_string(), "y".to_string())));
    }

    #[test]
    fn test_unrecognized_columns_fall_back_to_literals() {
        let rows = rows(vec![json!({"foo": 1, "bar": 2})]);
        assert_eq!(infer_axes(&rows), Some(("x".to_string(), "y".to_string())));
    }

    #[test]
    fn test_override_requires_field_on_first_row() {
        let row = json!({"a": 1, "b": 2}).as_object().cloned().unwrap();
        assert_eq!(resolve_key(Some("a"), Some(&row), "x"), "a");
        assert_eq!(resolve_key(Some(" a "), Some(&row), "x"), "x");
        assert_eq!(resolve_key(Some("missing"), Some(&row), "x"), "x");
        assert_eq!(resolve_key(Some("  "), Some(&row), "x"), "x");
        assert_eq!(resolve_key(None, Some(&row), "x"), "x");
        assert_eq!(resolve_key(Some("a"), None, "x"), "x");
    }

    #[test]
    fn test_override_is_matched_verbatim() {
        let row = json!({" a ": 1, "a": 2}).as_object().cloned().unwrap();
        assert_eq!(resolve_key(Some(" a "), Some(&row), "x"), " a ");
        assert_eq!(resolve_key(Some("a"), Some(&row), "x"), "a");
    }
}

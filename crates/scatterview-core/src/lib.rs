use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub mod cancellation;
pub mod error;
pub mod value;

pub use cancellation::CancellationToken;
pub use error::{RendererError, SourceError};
pub use value::{
    MAX_SAFE_INTEGER, cluster_label, coerce_number, has_field, label_string, to_json_safe,
};

/// One record of loaded data. Field order follows the source file.
pub type Row = Map<String, Value>;

/// Rows are handed out to the renderer and host as shared, read-only snapshots.
pub type SharedRow = Arc<Row>;

/// Literal coordinate keys used when nothing better can be inferred.
pub const FALLBACK_X_KEY: &str = "x";
pub const FALLBACK_Y_KEY: &str = "y";

/// Label assigned when a dataset carries no usable cluster values at all.
pub const FALLBACK_CLUSTER_LABEL: &str = "0";

/// Field names actually used for one render cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectiveKeys {
    pub x_key: String,
    pub y_key: String,
    pub cluster_key: String,
}

impl Default for EffectiveKeys {
    fn default() -> Self {
        Self {
            x_key: FALLBACK_X_KEY.to_string(),
            y_key: FALLBACK_Y_KEY.to_string(),
            cluster_key: String::new(),
        }
    }
}

impl fmt::Display for EffectiveKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={} y={} cluster={}", self.x_key, self.y_key, self.cluster_key)
    }
}

/// Renderable point: coordinates plus an index into the active palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub palette_index: usize,
}

impl Point {
    pub const fn new(x: f64, y: f64, palette_index: usize) -> Self {
        Self {
            x,
            y,
            palette_index,
        }
    }
}

/// Legend summary for one cluster, in palette order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub name: String,
    /// `#rrggbb`
    pub color: String,
    /// Number of valid rows carrying this label.
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_keys_default_uses_literal_axes() {
        let keys = EffectiveKeys::default();
        assert_eq!(keys.x_key, "x");
        assert_eq!(keys.y_key, "y");
        assert!(keys.cluster_key.is_empty());
    }

    #[test]
    fn test_legend_entry_serializes_with_plain_field_names() {
        let entry = LegendEntry {
            name: "a".to_string(),
            color: "#f26d6d".to_string(),
            count: 2,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "a");
        assert_eq!(json["color"], "#f26d6d");
        assert_eq!(json["count"], 2);
    }
}

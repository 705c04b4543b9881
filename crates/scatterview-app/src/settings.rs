use scatterview_pipeline::{DEFAULT_CLUSTER_FIELD, TooltipLimits};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-facing configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    pub source_url: String,
    /// Column override for x; ignored unless present on the first row.
    pub x_field: String,
    /// Column override for y; ignored unless present on the first row.
    pub y_field: String,
    pub cluster_field: String,
    pub point_size: f32,
    /// Enables `debug_snapshot`.
    pub debug: bool,
    pub hover: HoverTiming,
    pub tooltip: TooltipLimits,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            x_field: String::new(),
            y_field: String::new(),
            cluster_field: DEFAULT_CLUSTER_FIELD.to_string(),
            point_size: default_point_size(),
            debug: false,
            hover: HoverTiming::default(),
            tooltip: TooltipLimits::default(),
        }
    }
}

fn default_point_size() -> f32 {
    3.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverTiming {
    /// A tooltip shown within this window makes the next one appear at once.
    pub warm_window_ms: u64,
    pub cold_delay_ms: u64,
}

impl Default for HoverTiming {
    fn default() -> Self {
        Self {
            warm_window_ms: 800,
            cold_delay_ms: 150,
        }
    }
}

impl HoverTiming {
    pub fn warm_window(&self) -> Duration {
        Duration::from_millis(self.warm_window_ms)
    }

    pub fn cold_delay(&self) -> Duration {
        Duration::from_millis(self.cold_delay_ms)
    }
}

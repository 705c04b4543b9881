//! Tooltip content formatting and placement.

use scatterview_core::{Row, label_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounds applied when formatting and placing tooltips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipLimits {
    /// Fields rendered before the elision note.
    pub max_fields: usize,
    /// Characters kept from long string values.
    pub max_string_chars: usize,
    /// Gap between pointer and tooltip box, in pixels.
    pub offset_px: f32,
}

impl Default for TooltipLimits {
    fn default() -> Self {
        Self {
            max_fields: 50,
            max_string_chars: 200,
            offset_px: 12.0,
        }
    }
}

/// Approximate glyph metrics used to size the tooltip box before layout.
pub const TOOLTIP_CHAR_WIDTH_PX: f32 = 7.0;
pub const TOOLTIP_LINE_HEIGHT_PX: f32 = 16.0;
pub const TOOLTIP_PADDING_PX: f32 = 8.0;

/// Estimated box size for a title plus body lines.
pub fn estimate_tooltip_size(title: &str, lines: &[String]) -> Vec2 {
    let widest = lines
        .iter()
        .map(|line| line.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0);
    let line_count = lines.len() + 1;
    Vec2::new(
        widest as f32 * TOOLTIP_CHAR_WIDTH_PX + 2.0 * TOOLTIP_PADDING_PX,
        line_count as f32 * TOOLTIP_LINE_HEIGHT_PX + 2.0 * TOOLTIP_PADDING_PX,
    )
}

fn format_value(value: &Value, limits: &TooltipLimits) -> String {
    match value {
        Value::String(s) => {
            if s.chars().count() > limits.max_string_chars {
                let kept: String = s.chars().take(limits.max_string_chars).collect();
                format!("{kept}…")
            } else {
                s.clone()
            }
        }
        Value::Array(items) if items.len() == 1 => "[1 item]".to_string(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(_) => "{…}".to_string(),
        other => label_string(other),
    }
}

/// `key: value` lines for a row, capped at `limits.max_fields`.
pub fn format_tooltip(row: &Row, limits: &TooltipLimits) -> Vec<String> {
    let mut lines: Vec<String> = row
        .iter()
        .take(limits.max_fields)
        .map(|(key, value)| format!("{key}: {}", format_value(value, limits)))
        .collect();

    let hidden = row.len().saturating_sub(limits.max_fields);
    if hidden > 0 {
        let noun = if hidden == 1 { "field" } else { "fields" };
        lines.push(format!("… {hidden} more {noun}"));
    }
    lines
}

/// Top-left corner for a tooltip box near `pointer`.
///
/// The box sits below-right of the pointer and flips to the opposite side
/// when it would overflow the right or bottom edge of `bounds`. The result
/// is clamped inside `bounds` whenever the box fits at all.
pub fn place_tooltip(pointer: Vec2, size: Vec2, bounds: Vec2, offset: f32) -> Vec2 {
    Vec2::new(
        place_axis(pointer.x, size.x, bounds.x, offset),
        place_axis(pointer.y, size.y, bounds.y, offset),
    )
}

fn place_axis(pointer: f32, extent: f32, bound: f32, offset: f32) -> f32 {
    let mut start = pointer + offset;
    if start + extent > bound {
        start = pointer - offset - extent;
    }
    start.clamp(0.0, (bound - extent).max(0.0))
}

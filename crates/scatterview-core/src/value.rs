//! Coercion helpers for loosely typed row values.
//!
//! Every helper here has an explicit fallback instead of relying on
//! truthiness, so a malformed row can never abort a pipeline pass.

use crate::Row;
use serde_json::{Number, Value};

/// Largest integer a double can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Coerce a row value to a finite number.
///
/// Numbers pass through, strings are parsed after trimming and a blank string
/// counts as zero. Everything else (booleans, null, containers) yields `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_numeric_str(s)?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let (digits, radix) = match trimmed.get(..2) {
        Some("0x") | Some("0X") => (&trimmed[2..], 16),
        Some("0o") | Some("0O") => (&trimmed[2..], 8),
        Some("0b") | Some("0B") => (&trimmed[2..], 2),
        _ => return trimmed.parse::<f64>().ok(),
    };
    u64::from_str_radix(digits, radix).ok().map(|v| v as f64)
}

/// String form of a value, matching how hosts print labels.
///
/// Integral floats print without a fractional part so `3.0` and `3` land on
/// the same label.
pub fn label_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_label(n),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => label_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_label(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Cluster label for a field value, if the value is usable.
///
/// Missing, null and blank-after-trim values are unusable.
pub fn cluster_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        other => {
            let label = label_string(other);
            if label.trim().is_empty() {
                None
            } else {
                Some(label)
            }
        }
    }
}

/// True if `key` is an own field of `row`.
pub fn has_field(row: &Row, key: &str) -> bool {
    row.contains_key(key)
}

/// Copy of `value` that survives a round trip through a double-based host.
///
/// Integers outside the safe range are stringified; everything else is
/// passed through unchanged.
pub fn to_json_safe(value: &Value) -> Value {
    match value {
        Value::Number(n) if is_unsafe_integer(n) => Value::String(n.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(to_json_safe).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json_safe(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_unsafe_integer(n: &Number) -> bool {
    if let Some(i) = n.as_i64() {
        return !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i);
    }
    n.as_u64().is_some_and(|u| u > MAX_SAFE_INTEGER as u64)
}

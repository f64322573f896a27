//! Helpers for reading backend payloads that spell the same field several ways.

use serde_json::Value;

/// Returns the first of `keys` that holds a non-empty string (numbers are
/// rendered as text).
pub fn first_string(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Returns the first of `keys` that holds a number, or a string that parses as
/// one. A trailing `%` is tolerated.
pub fn first_number(object: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    })
}

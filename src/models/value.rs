//! Helpers over `serde_json::Value`, the value type of every field.

use itertools::Itertools;
use serde_json::Value;

/// The one emptiness predicate used by the skip policy and flag options.
///
/// Empty values are: `null`, the empty string, `false`, numeric zero
/// (`0` or `0.0`), an empty array and an empty object. The string `"0"` is
/// NOT empty, nor is whitespace.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Truthiness of a flag option such as `cancelOnFail`.
pub fn is_truthy(value: &Value) -> bool {
    !is_empty(value)
}

/// Numeric view of a value: numbers, and strings that parse as numbers.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Text form used by string predicates and placeholder interpolation.
///
/// Strings are returned without quotes, `null` becomes the empty string and
/// booleans follow the `"1"` / `""` convention of form input.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_text).join(", "),
        other => other.to_string(),
    }
}

//! Stable rendering of assertion arguments for failure messages.

use serde_json::Value;

/// Render a value for a failure message.
///
/// Scalars render on one line (strings quoted), arrays and objects as
/// indented multi-line JSON. Object keys come out sorted, so output is stable.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        _ => value.to_string(),
    }
}

/// Render a list of arguments separated by `", "`.
#[must_use]
pub fn stringify_all(values: &[Value]) -> String {
    values.iter().map(stringify).collect::<Vec<_>>().join(", ")
}

//! Neutralizes operator-like input before it reaches the store.
//!
//! Structured input loses every object key that starts with `$` or contains
//! a `.`; free text loses control characters other than tab and line breaks.

use serde_json::Value;

/// Recursively drop operator-like keys from a JSON value
pub fn sanitize_json(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_operator_key(key))
                .map(|(key, value)| (key, sanitize_json(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json).collect()),
        other => other,
    }
}

fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Strip NUL and other control characters, keeping `\t`, `\r` and `\n`
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\r' | '\n'))
        .collect()
}

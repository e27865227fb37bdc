//! Deterministic ordering and serialization
//!
//! Golden files compare output byte for byte, so every object that reaches
//! disk goes through here. Sorting is explicit rather than relying on the
//! map type `serde_json` happens to be compiled with.

use serde_json::{Map, Value};

/// Rebuild a map with keys in lexicographic (code point) order
pub fn sort_keys(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().collect()
}

/// Sort the keys of every object in the tree
pub fn sort_keys_recursive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, val)| (key.clone(), sort_keys_recursive(val)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys_recursive).collect()),
        _ => value.clone(),
    }
}

/// Pretty JSON with sorted keys and a trailing newline
pub fn to_canonical_string(value: &Value) -> serde_json::Result<String> {
    let mut output = serde_json::to_string_pretty(&sort_keys_recursive(value))?;
    output.push('\n');
    Ok(output)
}

/// Whether the keys of a map are non-decreasing
pub fn is_sorted(map: &Map<String, Value>) -> bool {
    map.keys()
        .zip(map.keys().skip(1))
        .all(|(previous, next)| previous <= next)
}

//! Inbound data normalization shared by the security middleware and extractors.

use serde_json::{Map, Value};

/// Keys that could be read as query operators (`$gt`) or path traversal (`a.b`)
pub fn is_forbidden_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Drop forbidden keys from every object, at any depth
pub fn strip_forbidden_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| {
                let keep = !is_forbidden_key(key);
                if !keep {
                    tracing::warn!(key = %key, "stripped forbidden key from request");
                }
                keep
            });
            for v in map.values_mut() {
                strip_forbidden_keys(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_forbidden_keys),
        _ => {}
    }
}

/// Escape markup delimiters so stored text cannot inject HTML
pub fn escape_markup(s: &str) -> String {
    if !s.contains(['<', '>']) {
        return s.to_string();
    }
    s.replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape then trim, the treatment every inbound string leaf receives
pub fn clean_text(s: &str) -> String {
    escape_markup(s).trim().to_string()
}

/// Escape markup and trim every string leaf
pub fn clean_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = clean_text(s),
        Value::Array(items) => items.iter_mut().for_each(clean_strings),
        Value::Object(map) => map.values_mut().for_each(clean_strings),
        _ => {}
    }
}

/// Full body treatment: key stripping and markup escaping run before trimming
pub fn sanitize_value(value: &mut Value) {
    strip_forbidden_keys(value);
    clean_strings(value);
}

/// Sanitize query pairs and apply parameter-pollution rules.
///
/// Non-whitelisted keys keep only their last value, at the position of their
/// first occurrence; whitelisted keys keep every value.
pub fn sanitize_query_pairs(pairs: Vec<(String, String)>, whitelist: &[String]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::with_capacity(pairs.len());

    for (key, value) in pairs {
        let key = key.trim().to_string();
        if key.is_empty() || is_forbidden_key(&key) {
            continue;
        }
        let value = clean_text(&value);

        if whitelist.iter().any(|w| *w == key) {
            out.push((key, value));
            continue;
        }

        match out.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => out.push((key, value)),
        }
    }

    out
}

/// Query pairs as a JSON object for validation: repeated keys become arrays.
/// A blank value counts as a parameter that was not given.
pub fn query_to_value(pairs: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs.iter().filter(|(_, v)| !v.is_empty()) {
        match map.get_mut(key) {
            Some(Value::Array(items)) => items.push(Value::String(value.clone())),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value.clone())]);
            }
            None => {
                map.insert(key.clone(), Value::String(value.clone()));
            }
        }
    }
    Value::Object(map)
}

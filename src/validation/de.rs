//! Deserializers for query-string values, which always arrive as strings,
//! and for optional body text where blank means "no value".

use serde::{de::Error, Deserialize, Deserializer};
use serde_json::Value;

/// `"2"` or `2` into `Option<u32>`
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a non-negative integer")),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse::<u32>().map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {}", other))),
    }
}

/// `"true"`/`"false"` or a JSON bool into `Option<bool>`
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse::<bool>().map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!("expected a boolean, got {}", other))),
    }
}

/// Blank or whitespace-only text into `None`; pairs with `Chain::nullable`
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// A single value or a repeated key (`?estado=A&estado=B`) into a list
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(D::Error::custom(format!("expected a string, got {}", other))),
            })
            .collect(),
        Some(other) => Err(D::Error::custom(format!("expected a string, got {}", other))),
    }
}

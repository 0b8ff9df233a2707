//! Deserializers for fields the backend encodes inconsistently.
//!
//! Identifiers arrive as numbers or numeric strings, and boolean flags arrive
//! as `true`, `1`, `"1"` or `"true"` depending on the endpoint.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interprets a raw flag value as a boolean.
///
/// `true`, the number `1`, and the strings `"1"` / `"true"` (any case) are
/// truthy. Everything else, including `null`, is false.
pub fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1) || n.as_u64() == Some(1),
        Value::String(s) => truthy_str(s),
        _ => false,
    }
}

pub fn truthy_str(raw: &str) -> bool {
    let s = raw.trim();
    s == "1" || s.eq_ignore_ascii_case("true")
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().is_some_and(truthy))
}

fn id_from_value(raw: Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An optional identifier. Empty strings and `null` map to `None`.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(id_from_value))
}

pub fn id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let text = raw.to_string();
    id_from_value(raw).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {text}")))
}

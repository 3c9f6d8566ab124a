//! Tolerant field decoders for attribute payloads
//!
//! The remote service sends `null`, `""` or `false` where a field is unset,
//! and older records sometimes carry the wrong scalar type. One odd field
//! must not reject the page it arrived on, so these decoders fall back to
//! the field's default instead of failing.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::is_truthy;

/// Decode `T`, or `T::default()` when the value is `null` or mistyped
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Optional timestamp; falsy or unparseable values decode as `None`
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&value))
}

/// Soft-delete marker. Falsy values mean live; a truthy value that is not a
/// timestamp still marks the record deleted, at the epoch.
pub fn deletion<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !is_truthy(&value) {
        return Ok(None);
    }
    Ok(Some(parse_timestamp(&value).unwrap_or_default()))
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

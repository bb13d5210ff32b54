// src/utils/de.rs

//! Serde helpers for the upstream JSON payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Deserialize a string field, mapping empty or whitespace-only values to
/// `None`. The upstream API sends `""` where it means "no value".
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Deserialize a unix-seconds timestamp. Absent or out-of-range values
/// become `None`.
pub fn unix_timestamp_as_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        description: Option<String>,
        #[serde(default, deserialize_with = "unix_timestamp_as_datetime")]
        created: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_empty_string_becomes_none() {
        let sample: Sample = serde_json::from_str(r#"{"description": ""}"#).unwrap();
        assert_eq!(sample.description, None);

        let sample: Sample = serde_json::from_str(r#"{"description": "  "}"#).unwrap();
        assert_eq!(sample.description, None);

        let sample: Sample = serde_json::from_str(r#"{"description": "text"}"#).unwrap();
        assert_eq!(sample.description.as_deref(), Some("text"));
    }

    #[test]
    fn test_unix_timestamp() {
        let sample: Sample = serde_json::from_str(r#"{"created": 1500000000}"#).unwrap();
        let created = sample.created.unwrap();
        assert_eq!(created.timestamp(), 1_500_000_000);

        let sample: Sample = serde_json::from_str(r#"{"created": null}"#).unwrap();
        assert!(sample.created.is_none());
    }
}

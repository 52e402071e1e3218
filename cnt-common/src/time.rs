//! Timestamp utilities

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Human-readable format used in the snapshot envelope
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert whole days to a signed duration, saturating instead of panicking
pub fn days_to_duration(days: u32) -> Duration {
    Duration::try_days(i64::from(days)).unwrap_or(Duration::MAX)
}

/// Format a timestamp for the snapshot envelope (UTC, second precision)
pub fn format_snapshot_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()
}

/// Parse an envelope timestamp
///
/// Accepts the envelope format and falls back to RFC 3339.
pub fn parse_snapshot_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(raw, SNAPSHOT_TIMESTAMP_FORMAT) {
        Ok(naive) => Ok(naive.and_utc()),
        Err(_) => DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc)),
    }
}

/// Serde adapter for an optional envelope timestamp
pub mod snapshot_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_snapshot_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_snapshot_timestamp(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

//! Time-windowed retention for persisted records

use chrono::{DateTime, Duration, Utc};
use cnt_common::Record;

/// Keep records with `now - observed_at <= max_age`
///
/// The boundary is inclusive. Records observed after `now` (clock skew
/// between runs) have a negative age and are kept. `now` is injected so the
/// filter never reads a clock itself.
pub fn apply_retention(records: Vec<Record>, max_age: Duration, now: DateTime<Utc>) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| now.signed_duration_since(record.observed_at()) <= max_age)
        .collect()
}

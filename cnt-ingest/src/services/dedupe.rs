//! Stable record deduplication

use cnt_common::record::RecordId;
use cnt_common::Record;
use std::collections::HashSet;

/// Keep the first record seen for each identity
///
/// Survivors keep their first-appearance order; later duplicates are dropped
/// silently. Idempotent.
pub fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<RecordId> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.id().clone()))
        .collect()
}

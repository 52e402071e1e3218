//! Merging fresh records into the persisted set
//!
//! Ordering decides which copy of a shared identity survives: dedupe keeps the
//! first occurrence, so whichever side is placed first wins its text.
//! Classification flags are the exception and always come from the fresh
//! batch.

use cnt_common::record::RecordId;
use cnt_common::Record;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::dedupe::dedupe;

/// Concatenation order for [`merge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// Fresh records first; fresh text supersedes persisted text
    #[default]
    NewFirst,
    /// Persisted records first; persisted text is kept
    ExistingFirst,
    /// Fresh records in random order, then persisted records
    NewShuffledFirst,
}

impl MergeOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeOrder::NewFirst => "new_first",
            MergeOrder::ExistingFirst => "existing_first",
            MergeOrder::NewShuffledFirst => "new_shuffled_first",
        }
    }
}

impl fmt::Display for MergeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "new_first" => Ok(MergeOrder::NewFirst),
            "existing_first" => Ok(MergeOrder::ExistingFirst),
            "new_shuffled_first" => Ok(MergeOrder::NewShuffledFirst),
            other => Err(format!(
                "unknown merge order '{}' (expected new_first, existing_first or new_shuffled_first)",
                other
            )),
        }
    }
}

/// Merge fresh and persisted records (thread-local RNG for shuffling)
pub fn merge(new: Vec<Record>, existing: Vec<Record>, order: MergeOrder) -> Vec<Record> {
    merge_with_rng(new, existing, order, &mut rand::thread_rng())
}

/// Merge fresh and persisted records
///
/// **Algorithm:**
/// 1. Remember score / hot flag of every fresh record
/// 2. Concatenate in `order` (shuffling the fresh side for `NewShuffledFirst`)
/// 3. Dedupe, first occurrence wins
/// 4. Survivors with a fresh counterpart take its score / hot flag
pub fn merge_with_rng<R: Rng + ?Sized>(
    mut new: Vec<Record>,
    existing: Vec<Record>,
    order: MergeOrder,
    rng: &mut R,
) -> Vec<Record> {
    let fresh: HashMap<RecordId, Record> = new
        .iter()
        .rev()
        .map(|r| (r.id().clone(), r.clone()))
        .collect();

    let combined = match order {
        MergeOrder::NewFirst => concat(new, existing),
        MergeOrder::ExistingFirst => concat(existing, new),
        MergeOrder::NewShuffledFirst => {
            new.shuffle(rng);
            concat(new, existing)
        }
    };

    let mut merged = dedupe(combined);
    for record in &mut merged {
        if let Some(latest) = fresh.get(record.id()) {
            record.refresh_classification(latest);
        }
    }

    merged
}

fn concat(mut first: Vec<Record>, second: Vec<Record>) -> Vec<Record> {
    first.extend(second);
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(id: &str, title: &str) -> Record {
        Record::new(RecordId::new(id), title, Utc::now())
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn test_new_first_keeps_new_copy() {
        let merged = merge(vec![record("1", "new")], vec![record("1", "old")], MergeOrder::NewFirst);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "new");
    }

    #[test]
    fn test_existing_first_keeps_old_copy() {
        let merged = merge(
            vec![record("1", "new")],
            vec![record("1", "old")],
            MergeOrder::ExistingFirst,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "old");
    }

    #[test]
    fn test_order_of_survivors() {
        let new = vec![record("c", "c"), record("a", "a2")];
        let existing = vec![record("a", "a1"), record("b", "b")];

        assert_eq!(
            ids(&merge(new.clone(), existing.clone(), MergeOrder::NewFirst)),
            vec!["c", "a", "b"]
        );
        assert_eq!(
            ids(&merge(new, existing, MergeOrder::ExistingFirst)),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_shuffled_keeps_new_before_existing() {
        let new: Vec<Record> = (0..20).map(|i| record(&format!("n{}", i), "new")).collect();
        let existing = vec![record("e1", "old"), record("n3", "old")];
        let mut rng = StdRng::seed_from_u64(7);

        let merged = merge_with_rng(new, existing, MergeOrder::NewShuffledFirst, &mut rng);

        assert_eq!(merged.len(), 21);
        assert!(merged[..20].iter().all(|r| r.id().as_str().starts_with('n')));
        assert_eq!(merged[20].id().as_str(), "e1");
        let n3 = merged.iter().find(|r| r.id().as_str() == "n3").unwrap();
        assert_eq!(n3.title, "new");
    }

    #[test]
    fn test_shuffle_is_deterministic_per_seed() {
        let new: Vec<Record> = (0..10).map(|i| record(&i.to_string(), "t")).collect();

        let a = merge_with_rng(new.clone(), Vec::new(), MergeOrder::NewShuffledFirst, &mut StdRng::seed_from_u64(1));
        let b = merge_with_rng(new, Vec::new(), MergeOrder::NewShuffledFirst, &mut StdRng::seed_from_u64(1));

        assert_eq!(a, b);
    }

    #[test]
    fn test_flags_refreshed_even_when_existing_wins() {
        let new = vec![record("1", "new").with_score(0).with_hot(false)];
        let existing = vec![record("1", "old").with_score(40).with_hot(true)];

        let merged = merge(new, existing, MergeOrder::ExistingFirst);

        assert_eq!(merged[0].title, "old");
        assert_eq!(merged[0].score, 0);
        assert!(!merged[0].is_hot);
    }

    #[test]
    fn test_existing_only_records_keep_flags() {
        let existing = vec![record("1", "old").with_score(12).with_hot(true)];

        let merged = merge(Vec::new(), existing, MergeOrder::NewFirst);

        assert_eq!(merged[0].score, 12);
        assert!(merged[0].is_hot);
    }

    #[test]
    fn test_merge_order_parsing() {
        assert_eq!("new_first".parse::<MergeOrder>().unwrap(), MergeOrder::NewFirst);
        assert_eq!("existing-first".parse::<MergeOrder>().unwrap(), MergeOrder::ExistingFirst);
        assert_eq!(
            "NEW_SHUFFLED_FIRST".parse::<MergeOrder>().unwrap(),
            MergeOrder::NewShuffledFirst
        );
        assert!("random".parse::<MergeOrder>().is_err());
    }
}

//! Ingest pipeline orchestration
//!
//! One run: fetch → translate → dedupe → load snapshot → retention (persisted
//! side only) → merge → save. Fetch failures are absorbed (empty batch);
//! snapshot failures abort the run.

use chrono::{DateTime, Duration, Utc};
use cnt_common::{time, Record, RecordSet, Result};

use crate::services::{
    apply_retention, dedupe, merge, JsonSnapshotStore, MergeOrder, RecordTranslator, TransformReport,
};
use crate::types::{NewsSource, Translator};

/// Merge and retention settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Maximum age of persisted records (inclusive)
    pub retention: Duration,
    pub merge_order: MergeOrder,
    /// Cap on persisted records; front-of-order records are kept
    pub max_records: Option<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            retention: Duration::days(3),
            merge_order: MergeOrder::NewFirst,
            max_records: None,
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Records returned by the source
    pub fetched: usize,
    /// Why the fetch produced nothing, if it failed
    pub source_error: Option<String>,
    pub transform: TransformReport,
    /// Duplicates dropped from the fresh batch
    pub batch_duplicates: usize,
    /// Records in the snapshot before this run
    pub loaded: usize,
    /// Persisted records dropped by retention
    pub expired: usize,
    /// Records after merge and dedupe
    pub merged: usize,
    /// Records dropped by the `max_records` cap
    pub truncated: usize,
    pub persisted: usize,
    pub hot: usize,
    pub saved_at: DateTime<Utc>,
}

impl RunReport {
    pub fn log_summary(&self) {
        tracing::info!(
            fetched = self.fetched,
            source_error = self.source_error.as_deref().unwrap_or("none"),
            translated_fields = self.transform.translated(),
            skipped_fields = self.transform.skipped(),
            failed_fields = self.transform.failed(),
            success_rate = self.transform.success_rate().map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "n/a".to_string()),
            loaded = self.loaded,
            expired = self.expired,
            merged = self.merged,
            truncated = self.truncated,
            persisted = self.persisted,
            hot = self.hot,
            saved_at = %time::format_snapshot_timestamp(&self.saved_at),
            "Ingest run complete"
        );

        for failure in self.transform.failures() {
            tracing::warn!(
                id = %failure.record_id,
                field = %failure.field,
                "Field left untranslated"
            );
        }
    }
}

/// Fetch/translate/merge/persist pipeline
pub struct IngestPipeline<S, T> {
    source: S,
    translator: RecordTranslator<T>,
    store: JsonSnapshotStore,
    settings: PipelineSettings,
}

impl<S: NewsSource, T: Translator> IngestPipeline<S, T> {
    pub fn new(
        source: S,
        translator: RecordTranslator<T>,
        store: JsonSnapshotStore,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            translator,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &JsonSnapshotStore {
        &self.store
    }

    /// Run once using the wall clock for retention
    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(time::now()).await
    }

    /// Run once, measuring retention against `now`
    ///
    /// # Errors
    /// Fatal errors only: snapshot load/save failures and source errors other
    /// than `SourceUnavailable`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport> {
        tracing::info!(
            source = self.source.name(),
            snapshot = %self.store.path().display(),
            merge_order = %self.settings.merge_order,
            "Starting ingest run"
        );

        // Step 1: Fetch (single attempt, failure means an empty batch)
        let mut source_error = None;
        let fresh = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) if !e.is_fatal() => {
                tracing::warn!(
                    source = self.source.name(),
                    error = %e,
                    "Fetch failed, continuing with an empty batch"
                );
                source_error = Some(e.to_string());
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let fetched = fresh.len();

        // Step 2: Translate field by field
        let (translated, transform) = self.translator.translate_batch(fresh).await;

        // Step 3: Collapse duplicates within the batch
        let batch = dedupe(translated);
        let batch_duplicates = fetched - batch.len();

        // Step 4: Load persisted set and drop expired records
        let existing = self.store.load()?;
        let loaded = existing.len();
        let retained = apply_retention(existing.records, self.settings.retention, now);
        let expired = loaded - retained.len();

        // Step 5: Merge (dedupes again, fresh flags win)
        let mut merged = merge(batch, retained, self.settings.merge_order);
        let merged_count = merged.len();
        if let Some(cap) = self.settings.max_records {
            merged.truncate(cap);
        }
        let truncated = merged_count - merged.len();

        // Step 6: Persist
        let saved = self.store.save(RecordSet::new(merged))?;
        log_persisted(&saved.records);

        let saved_at = saved.saved_at.unwrap_or(now);
        Ok(RunReport {
            fetched,
            source_error,
            transform,
            batch_duplicates,
            loaded,
            expired,
            merged: merged_count,
            truncated,
            persisted: saved.len(),
            hot: saved.hot_records().count(),
            saved_at,
        })
    }
}

fn log_persisted(records: &[Record]) {
    for record in records {
        tracing::debug!(title = %record.title, url = %record.id(), "Persisted record");
    }
}

//! Test Helper Utilities
//!
//! Shared stubs and mock HTTP servers for testing cnt-ingest

#![allow(dead_code)]

pub mod mock_servers;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cnt_common::record::{RecordId, TextField};
use cnt_common::{Error, Record, Result};
use cnt_ingest::services::{JsonSnapshotStore, RecordTranslator, SnapshotLayout};
use cnt_ingest::utils::RetryPolicy;
use cnt_ingest::{IngestPipeline, NewsSource, PipelineSettings, TranslateError, Translator};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Record with a description, observed at `observed_at`
pub fn news(id: &str, title: &str, observed_at: DateTime<Utc>) -> Record {
    Record::new(RecordId::new(id), title, observed_at).with_description(format!("{} details", title))
}

pub fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id().as_str()).collect()
}

pub fn find<'a>(records: &'a [Record], id: &str) -> &'a Record {
    records
        .iter()
        .find(|r| r.id().as_str() == id)
        .unwrap_or_else(|| panic!("record {} not found", id))
}

/// Source returning a fixed batch
pub struct StaticSource {
    pub batch: Vec<Record>,
}

#[async_trait]
impl NewsSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        Ok(self.batch.clone())
    }
}

/// Source that always reports the upstream as unavailable
pub struct UnavailableSource;

#[async_trait]
impl NewsSource for UnavailableSource {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        Err(Error::SourceUnavailable("feed returned status 503".to_string()))
    }
}

/// Translator appending a version tag, counting calls
#[derive(Clone)]
pub struct TaggingTranslator {
    pub tag: &'static str,
    pub calls: Arc<AtomicUsize>,
}

impl TaggingTranslator {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> std::result::Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} [{}:{}]", text, target_lang, self.tag))
    }
}

/// Translator that never succeeds
#[derive(Clone, Default)]
pub struct BrokenTranslator {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Translator for BrokenTranslator {
    async fn translate(&self, _text: &str, _target_lang: &str) -> std::result::Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TranslateError::Network("connection reset".to_string()))
    }
}

/// Pipeline over stubs, translating both text fields into "ms" with no retry delay
pub fn stub_pipeline<S: NewsSource, T: Translator>(
    source: S,
    translator: T,
    snapshot: &Path,
    layout: SnapshotLayout,
    settings: PipelineSettings,
) -> IngestPipeline<S, T> {
    IngestPipeline::new(
        source,
        RecordTranslator::new(
            translator,
            "ms",
            vec![TextField::Title, TextField::Description],
            RetryPolicy::immediate(3),
        ),
        JsonSnapshotStore::new(snapshot, layout),
        settings,
    )
}

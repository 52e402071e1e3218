//! cnt-ingest library interface
//!
//! Exposes the pipeline stages and their wiring for the binary and for
//! integration tests.

pub mod config;
pub mod pipeline;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::config::{Args, IngestConfig};
pub use crate::pipeline::{IngestPipeline, PipelineSettings, RunReport};
pub use crate::types::{NewsSource, TranslateError, Translator};

use cnt_common::Result;
use services::{CryptoPanicClient, EasyPeasyClient, JsonSnapshotStore, RecordTranslator};

/// Production pipeline: CryptoPanic feed, Easy Peasy translation, JSON snapshot
pub type DefaultPipeline = IngestPipeline<CryptoPanicClient, EasyPeasyClient>;

/// Build the production pipeline from resolved configuration
pub fn build_pipeline(config: &IngestConfig) -> Result<DefaultPipeline> {
    let source = CryptoPanicClient::new(config.feed_config())?;
    let client = EasyPeasyClient::new(
        config.translate_url.clone(),
        config.translate_api_key.clone(),
        config.http_timeout,
    )?;
    let translator = RecordTranslator::new(
        client,
        config.target_lang.clone(),
        config.fields.clone(),
        config.retry.clone(),
    );
    let store = JsonSnapshotStore::new(config.snapshot_path.clone(), config.snapshot_layout);

    Ok(IngestPipeline::new(source, translator, store, config.pipeline_settings()))
}

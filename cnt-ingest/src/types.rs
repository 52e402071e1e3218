//! Collaborator traits for the ingest pipeline
//!
//! The pipeline talks to the outside world through two seams:
//! - [`NewsSource`]: produces one batch of freshly observed records
//! - [`Translator`]: translates a single piece of text
//!
//! Production implementations live in [`crate::services`]; tests substitute
//! in-memory stubs.

use async_trait::async_trait;
use cnt_common::{Record, Result};
use thiserror::Error;

/// Source of news items
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Fetch one batch of records
    ///
    /// Every record carries `observed_at` = the fetch instant.
    ///
    /// # Errors
    /// `Error::SourceUnavailable` on non-success status, transport failure or
    /// an unreadable body. Nothing is returned for a partially read batch.
    async fn fetch(&self) -> Result<Vec<Record>>;
}

/// Text translation provider
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang`
    async fn translate(&self, text: &str, target_lang: &str) -> std::result::Result<String, TranslateError>;
}

/// Translation call errors (all treated as transient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

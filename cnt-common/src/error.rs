//! Common error types for the ingest pipeline

use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level error taxonomy
///
/// Only `ConfigMissing`, `Config` and `Persistence` are fatal for a run.
/// `SourceUnavailable` is absorbed by the pipeline (the batch becomes empty).
#[derive(Error, Debug)]
pub enum Error {
    /// Required setting absent or blank (named by its environment variable)
    #[error("Missing required configuration: {0}")]
    ConfigMissing(String),

    /// Configuration present but invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream feed returned a non-success status or an unusable body
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Snapshot could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that must abort the run with a non-zero exit
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::SourceUnavailable(_))
    }
}

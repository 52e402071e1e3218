//! Utility modules for cnt-ingest

pub mod retry;

pub use retry::{retry_with_backoff, Backoff, RetryOutcome, RetryPolicy};

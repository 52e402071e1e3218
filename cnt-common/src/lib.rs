//! # CNT Common Library
//!
//! Shared code for the news ingest pipeline including:
//! - Record model and record set envelope
//! - Error types
//! - Configuration file loading
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod record;
pub mod time;

pub use error::{Error, Result};
pub use record::{Record, RecordId, RecordSet};

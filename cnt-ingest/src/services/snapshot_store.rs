//! JSON snapshot store
//!
//! The whole record set lives in one JSON document:
//!
//! ```text
//! single: { "timestamp": "2025-01-07 09:05:03", "news": [ ... ] }
//! split:  { "timestamp": "...", "all_news": [ ... ], "hot_news": [ ... ] }
//! ```
//!
//! `hot_news` is derived from `all_news` on save and ignored on load.
//! Saves write a temporary file next to the target and rename it over the
//! snapshot, so readers never see a partial document.

use chrono::{DateTime, Timelike, Utc};
use cnt_common::time::snapshot_timestamp;
use cnt_common::{time, Error, Record, RecordSet, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;

use super::dedupe::dedupe;

/// Mode of a freshly created snapshot (before umask)
#[cfg(unix)]
const NEW_SNAPSHOT_MODE: u32 = 0o644;

/// Shape of the snapshot document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotLayout {
    /// One `news` array
    #[default]
    Single,
    /// `all_news` plus the derived `hot_news` subset
    Split,
}

impl fmt::Display for SnapshotLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotLayout::Single => "single",
            SnapshotLayout::Split => "split",
        })
    }
}

impl FromStr for SnapshotLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(SnapshotLayout::Single),
            "split" => Ok(SnapshotLayout::Split),
            other => Err(format!(
                "unknown snapshot layout '{}' (expected 'single' or 'split')",
                other
            )),
        }
    }
}

#[derive(Serialize)]
struct SingleEnvelope<'a> {
    #[serde(with = "snapshot_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    news: &'a [Record],
}

#[derive(Serialize)]
struct SplitEnvelope<'a> {
    #[serde(with = "snapshot_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    all_news: &'a [Record],
    hot_news: Vec<&'a Record>,
}

/// Any layout, as read back from disk
#[derive(Deserialize)]
struct StoredEnvelope {
    #[serde(default, with = "snapshot_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    news: Option<Vec<Record>>,
    #[serde(default)]
    all_news: Option<Vec<Record>>,
}

/// Snapshot file store
pub struct JsonSnapshotStore {
    path: PathBuf,
    layout: SnapshotLayout,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>, layout: SnapshotLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted set
    ///
    /// A missing file is an empty set. Either layout is accepted regardless of
    /// the configured one, so switching layouts keeps existing records.
    ///
    /// # Errors
    /// `Error::Persistence` if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<RecordSet> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot yet, starting empty");
                return Ok(RecordSet::empty());
            }
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "read {} failed: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let envelope: StoredEnvelope = serde_json::from_str(&content).map_err(|e| {
            Error::Persistence(format!("parse {} failed: {}", self.path.display(), e))
        })?;

        let records = envelope.news.or(envelope.all_news).ok_or_else(|| {
            Error::Persistence(format!(
                "{} has neither 'news' nor 'all_news'",
                self.path.display()
            ))
        })?;

        let loaded = records.len();
        let records = dedupe(records);
        if records.len() != loaded {
            tracing::warn!(
                path = %self.path.display(),
                dropped = loaded - records.len(),
                "Snapshot contained duplicate identities"
            );
        }

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "Loaded snapshot"
        );

        Ok(RecordSet {
            records,
            saved_at: envelope.timestamp,
        })
    }

    /// Replace the snapshot with `set`, stamped with the current instant
    ///
    /// Returns the set as persisted (timestamp truncated to whole seconds,
    /// matching what a later `load` reads back).
    ///
    /// # Errors
    /// `Error::Persistence` on any write failure. The previous snapshot is
    /// left in place and the temporary file is removed.
    pub fn save(&self, mut set: RecordSet) -> Result<RecordSet> {
        let now = time::now();
        set.saved_at = Some(now.with_nanosecond(0).unwrap_or(now));

        let json = match self.layout {
            SnapshotLayout::Single => serde_json::to_string_pretty(&SingleEnvelope {
                timestamp: set.saved_at,
                news: &set.records,
            }),
            SnapshotLayout::Split => serde_json::to_string_pretty(&SplitEnvelope {
                timestamp: set.saved_at,
                all_news: &set.records,
                hot_news: set.hot_records().collect(),
            }),
        }
        .map_err(|e| Error::Persistence(format!("encode snapshot failed: {}", e)))?;

        self.write_atomically(json.as_bytes())?;

        tracing::info!(
            path = %self.path.display(),
            layout = %self.layout,
            records = set.len(),
            "Snapshot saved"
        );

        Ok(set)
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let persistence = |what: &str, e: &dyn fmt::Display| {
            Error::Persistence(format!("{} for {} failed: {}", what, self.path.display(), e))
        };

        let mut temp = self
            .create_temp_file(dir)
            .map_err(|e| persistence("create temp file", &e))?;
        temp.write_all(bytes)
            .map_err(|e| persistence("write temp file", &e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| persistence("sync temp file", &e))?;
        temp.persist(&self.path)
            .map_err(|e| persistence("replace snapshot", &e.error))?;

        Ok(())
    }

    /// Temp file carrying the permissions the snapshot should end up with
    ///
    /// An existing snapshot keeps its mode across the rename; a new one is
    /// created world-readable.
    fn create_temp_file(&self, dir: &Path) -> std::io::Result<NamedTempFile> {
        match std::fs::metadata(&self.path) {
            Ok(existing) => {
                let temp = NamedTempFile::new_in(dir)?;
                temp.as_file().set_permissions(existing.permissions())?;
                Ok(temp)
            }
            Err(_) => new_snapshot_file(dir),
        }
    }
}

#[cfg(unix)]
fn new_snapshot_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(NEW_SNAPSHOT_MODE))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_snapshot_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

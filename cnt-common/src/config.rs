//! Configuration file loading
//!
//! Settings are resolved by the ingest binary with priority
//! command line / environment → TOML file → compiled default.
//! This module only knows how to locate and parse the TOML layer.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "CNT_CONFIG_FILE";

/// TOML configuration layer
///
/// Every field is optional; absent fields fall through to defaults.
/// Enumerated settings (merge order, layout, backoff) stay strings here and
/// are parsed with the same rules as their environment variable form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub cryptopanic_api_key: Option<String>,
    pub translate_api_key: Option<String>,
    pub source_url: Option<String>,
    pub translate_url: Option<String>,
    pub target_lang: Option<String>,
    pub fields: Option<Vec<String>>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub retry_backoff: Option<String>,
    pub retention_days: Option<u32>,
    pub merge_order: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_layout: Option<String>,
    pub max_pages: Option<u32>,
    pub hot_score_threshold: Option<i64>,
    pub max_records: Option<usize>,
    pub feed_filter: Option<String>,
    pub feed_currencies: Option<String>,
    pub feed_kind: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the config file to use, if any
///
/// An explicit path must exist. Without one, the platform config directory
/// (`~/.config/cnt/config.toml` on Linux) is used when present.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    Ok(default_config_path().filter(|p| p.exists()))
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cnt").join("config.toml"))
}

/// Load the TOML layer, or an empty layer when no file applies
pub fn load_optional_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(explicit)? {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading config file");
            load_toml_config(&path)
        }
        None => Ok(TomlConfig::default()),
    }
}

//! Configuration resolution for cnt-ingest
//!
//! Every setting resolves with priority: command line / environment → TOML
//! file → compiled default. The binary takes no arguments in normal use; each
//! flag exists only as an alternative spelling of its `CNT_*` variable.
//!
//! Credentials have no default. A missing or blank credential is reported as
//! `Error::ConfigMissing` before any component is built.

use clap::Parser;
use cnt_common::config::{TomlConfig, CONFIG_FILE_ENV};
use cnt_common::record::TextField;
use cnt_common::{time, Error, Result};
use reqwest::Url;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::pipeline::PipelineSettings;
use crate::services::cryptopanic_client::CRYPTOPANIC_POSTS_URL;
use crate::services::easypeasy_client::EASYPEASY_TRANSLATE_URL;
use crate::services::{FeedConfig, MergeOrder, SnapshotLayout};
use crate::utils::{Backoff, RetryPolicy};

pub const CRYPTOPANIC_API_KEY_ENV: &str = "CNT_CRYPTOPANIC_API_KEY";
pub const TRANSLATE_API_KEY_ENV: &str = "CNT_TRANSLATE_API_KEY";

const DEFAULT_TARGET_LANG: &str = "ms";
const DEFAULT_FIELDS: &str = "title,description";
const DEFAULT_SNAPSHOT_PATH: &str = "translated_news.json";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_RETENTION_DAYS: u32 = 3;
const DEFAULT_MAX_PAGES: u32 = 1;
const DEFAULT_HOT_SCORE_THRESHOLD: i64 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Command-line / environment layer
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cnt-ingest")]
#[command(about = "Fetch crypto news, translate it and merge it into a JSON snapshot")]
#[command(version)]
pub struct Args {
    /// TOML config file (defaults to <config dir>/cnt/config.toml if present)
    #[arg(long, env = CONFIG_FILE_ENV)]
    pub config_file: Option<PathBuf>,

    /// CryptoPanic API token
    #[arg(long, env = CRYPTOPANIC_API_KEY_ENV, hide_env_values = true)]
    pub cryptopanic_api_key: Option<String>,

    /// Translation API token
    #[arg(long, env = TRANSLATE_API_KEY_ENV, hide_env_values = true)]
    pub translate_api_key: Option<String>,

    /// Feed posts endpoint
    #[arg(long, env = "CNT_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Translation endpoint
    #[arg(long, env = "CNT_TRANSLATE_URL")]
    pub translate_url: Option<String>,

    /// Target language code
    #[arg(long, env = "CNT_TARGET_LANG")]
    pub target_lang: Option<String>,

    /// Comma-separated fields to translate (title, description)
    #[arg(long, env = "CNT_FIELDS")]
    pub fields: Option<String>,

    /// Translation attempts per field
    #[arg(long, env = "CNT_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Delay after the first failed attempt (ms)
    #[arg(long, env = "CNT_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    /// fixed | exponential
    #[arg(long, env = "CNT_RETRY_BACKOFF")]
    pub retry_backoff: Option<String>,

    /// Days a persisted record is kept
    #[arg(long, env = "CNT_RETENTION_DAYS")]
    pub retention_days: Option<u32>,

    /// new_first | existing_first | new_shuffled_first
    #[arg(long, env = "CNT_MERGE_ORDER")]
    pub merge_order: Option<String>,

    /// Snapshot file
    #[arg(long, env = "CNT_SNAPSHOT_PATH")]
    pub snapshot_path: Option<PathBuf>,

    /// single | split
    #[arg(long, env = "CNT_SNAPSHOT_LAYOUT")]
    pub snapshot_layout: Option<String>,

    /// Feed pages to follow
    #[arg(long, env = "CNT_MAX_PAGES")]
    pub max_pages: Option<u32>,

    /// Minimum vote score for the hot flag
    #[arg(long, env = "CNT_HOT_SCORE_THRESHOLD", allow_negative_numbers = true)]
    pub hot_score_threshold: Option<i64>,

    /// Cap on persisted records
    #[arg(long, env = "CNT_MAX_RECORDS")]
    pub max_records: Option<usize>,

    /// Feed `filter` parameter
    #[arg(long, env = "CNT_FEED_FILTER")]
    pub feed_filter: Option<String>,

    /// Feed `currencies` parameter
    #[arg(long, env = "CNT_FEED_CURRENCIES")]
    pub feed_currencies: Option<String>,

    /// Feed `kind` parameter
    #[arg(long, env = "CNT_FEED_KIND")]
    pub feed_kind: Option<String>,

    /// HTTP request timeout (seconds)
    #[arg(long, env = "CNT_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub cryptopanic_api_key: String,
    pub translate_api_key: String,
    pub source_url: String,
    pub translate_url: String,
    pub target_lang: String,
    pub fields: Vec<TextField>,
    pub retry: RetryPolicy,
    pub retention_days: u32,
    pub merge_order: MergeOrder,
    pub snapshot_path: PathBuf,
    pub snapshot_layout: SnapshotLayout,
    pub max_pages: u32,
    pub hot_score_threshold: i64,
    pub max_records: Option<usize>,
    pub feed_filter: Option<String>,
    pub feed_currencies: Option<String>,
    pub feed_kind: Option<String>,
    pub http_timeout: Duration,
}

impl IngestConfig {
    /// Resolve the final configuration from both layers
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let cryptopanic_api_key = require_key(
            CRYPTOPANIC_API_KEY_ENV,
            args.cryptopanic_api_key.as_ref(),
            toml.cryptopanic_api_key.as_ref(),
        )?;
        let translate_api_key = require_key(
            TRANSLATE_API_KEY_ENV,
            args.translate_api_key.as_ref(),
            toml.translate_api_key.as_ref(),
        )?;

        let source_url = pick(&args.source_url, &toml.source_url)
            .unwrap_or_else(|| CRYPTOPANIC_POSTS_URL.to_string());
        validate_url("CNT_SOURCE_URL", &source_url)?;

        let translate_url = pick(&args.translate_url, &toml.translate_url)
            .unwrap_or_else(|| EASYPEASY_TRANSLATE_URL.to_string());
        validate_url("CNT_TRANSLATE_URL", &translate_url)?;

        let target_lang = pick(&args.target_lang, &toml.target_lang)
            .unwrap_or_else(|| DEFAULT_TARGET_LANG.to_string());
        if target_lang.trim().is_empty() {
            return Err(Error::Config("CNT_TARGET_LANG must not be empty".to_string()));
        }

        let fields = match (&args.fields, &toml.fields) {
            (Some(raw), _) => parse_fields(raw.split(','))?,
            (None, Some(list)) => parse_fields(list.iter().map(String::as_str))?,
            (None, None) => parse_fields(DEFAULT_FIELDS.split(','))?,
        };

        let max_attempts = pick(&args.max_attempts, &toml.max_attempts).unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(Error::Config("CNT_MAX_ATTEMPTS must be at least 1".to_string()));
        }
        let retry = RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(
                pick(&args.retry_delay_ms, &toml.retry_delay_ms).unwrap_or(DEFAULT_RETRY_DELAY_MS),
            ),
            backoff: parse_setting::<Backoff>(
                "CNT_RETRY_BACKOFF",
                pick(&args.retry_backoff, &toml.retry_backoff),
            )?
            .unwrap_or(Backoff::Exponential),
        };

        let max_pages = pick(&args.max_pages, &toml.max_pages).unwrap_or(DEFAULT_MAX_PAGES);
        if max_pages == 0 {
            return Err(Error::Config("CNT_MAX_PAGES must be at least 1".to_string()));
        }

        Ok(Self {
            cryptopanic_api_key,
            translate_api_key,
            source_url,
            translate_url,
            target_lang,
            fields,
            retry,
            retention_days: pick(&args.retention_days, &toml.retention_days)
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            merge_order: parse_setting("CNT_MERGE_ORDER", pick(&args.merge_order, &toml.merge_order))?
                .unwrap_or_default(),
            snapshot_path: pick(&args.snapshot_path, &toml.snapshot_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            snapshot_layout: parse_setting(
                "CNT_SNAPSHOT_LAYOUT",
                pick(&args.snapshot_layout, &toml.snapshot_layout),
            )?
            .unwrap_or_default(),
            max_pages,
            hot_score_threshold: pick(&args.hot_score_threshold, &toml.hot_score_threshold)
                .unwrap_or(DEFAULT_HOT_SCORE_THRESHOLD),
            max_records: pick(&args.max_records, &toml.max_records),
            feed_filter: non_blank(pick(&args.feed_filter, &toml.feed_filter)),
            feed_currencies: non_blank(pick(&args.feed_currencies, &toml.feed_currencies)),
            feed_kind: non_blank(pick(&args.feed_kind, &toml.feed_kind)),
            http_timeout: Duration::from_secs(
                pick(&args.http_timeout_secs, &toml.http_timeout_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        })
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.source_url.clone(),
            api_key: self.cryptopanic_api_key.clone(),
            filter: self.feed_filter.clone(),
            currencies: self.feed_currencies.clone(),
            kind: self.feed_kind.clone(),
            max_pages: self.max_pages,
            hot_score_threshold: self.hot_score_threshold,
            timeout: self.http_timeout,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            retention: time::days_to_duration(self.retention_days),
            merge_order: self.merge_order,
            max_records: self.max_records,
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn require_key(env_name: &str, cli_or_env: Option<&String>, toml: Option<&String>) -> Result<String> {
    cli_or_env
        .filter(|k| is_valid_key(k))
        .or_else(|| toml.filter(|k| is_valid_key(k)))
        .map(|k| k.trim().to_string())
        .ok_or_else(|| Error::ConfigMissing(env_name.to_string()))
}

fn pick<T: Clone>(primary: &Option<T>, fallback: &Option<T>) -> Option<T> {
    primary.clone().or_else(|| fallback.clone())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_setting<T>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    raw.map(|s| s.parse::<T>().map_err(|e| Error::Config(format!("{}: {}", name, e))))
        .transpose()
}

fn validate_url(name: &str, raw: &str) -> Result<()> {
    Url::parse(raw)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("{}: invalid URL '{}': {}", name, raw, e)))
}

/// Parse an ordered field list, dropping blanks and repeats
fn parse_fields<'a>(items: impl Iterator<Item = &'a str>) -> Result<Vec<TextField>> {
    let mut fields = Vec::new();
    for item in items.filter(|s| !s.trim().is_empty()) {
        let field = item
            .parse::<TextField>()
            .map_err(|e| Error::Config(format!("CNT_FIELDS: {}", e)))?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    if fields.is_empty() {
        return Err(Error::Config("CNT_FIELDS names no fields".to_string()));
    }
    Ok(fields)
}

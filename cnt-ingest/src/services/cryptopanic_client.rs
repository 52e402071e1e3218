//! CryptoPanic feed client
//!
//! Fetches posts from the CryptoPanic posts API and normalizes each into a
//! [`Record`]. Record identity is the post's click-through URL, built from the
//! numeric post id, so it stays stable however the title is later rewritten.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cnt_common::record::RecordId;
use cnt_common::{time, Error, Record, Result};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use crate::types::NewsSource;

pub const CRYPTOPANIC_POSTS_URL: &str = "https://cryptopanic.com/api/v1/posts/";
const CLICK_URL_BASE: &str = "https://cryptopanic.com/news/click";
const USER_AGENT: &str = concat!("cnt-ingest/", env!("CARGO_PKG_VERSION"));

/// Feed request settings
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Posts endpoint
    pub base_url: String,
    pub api_key: String,
    /// Optional `filter` query value (e.g. "hot", "rising")
    pub filter: Option<String>,
    /// Optional comma-separated currency codes
    pub currencies: Option<String>,
    /// Optional `kind` query value ("news", "media")
    pub kind: Option<String>,
    /// Pages to follow through `next` links (at least 1)
    pub max_pages: u32,
    /// Minimum score for a post to be flagged hot
    pub hot_score_threshold: i64,
    pub timeout: Duration,
}

impl FeedConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: CRYPTOPANIC_POSTS_URL.to_string(),
            api_key: api_key.into(),
            filter: None,
            currencies: None,
            kind: None,
            max_pages: 1,
            hot_score_threshold: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

/// One page of the posts API
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    /// Absolute URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<FeedPost>,
}

/// Post as returned by the API (only the fields we keep)
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPost {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub metadata: Option<PostMetadata>,
    #[serde(default)]
    pub votes: Option<PostVotes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostVotes {
    #[serde(default)]
    pub positive: i64,
    #[serde(default)]
    pub negative: i64,
}

/// Click-through URL for a post id
pub fn click_url(post_id: u64) -> String {
    format!("{}/{}/", CLICK_URL_BASE, post_id)
}

/// Convert an API post into a record observed at `observed_at`
///
/// Score is positive minus negative votes; the hot flag is recomputed from it
/// on every fetch. Blank descriptions and images are treated as absent.
pub fn normalize_post(post: FeedPost, observed_at: DateTime<Utc>, hot_score_threshold: i64) -> Record {
    let score = post
        .votes
        .as_ref()
        .map(|v| v.positive.saturating_sub(v.negative))
        .unwrap_or(0);
    let metadata = post.metadata.unwrap_or_default();

    let mut record = Record::new(RecordId::new(click_url(post.id)), post.title, observed_at)
        .with_score(score)
        .with_hot(score >= hot_score_threshold);

    if let Some(description) = metadata.description.filter(|d| !d.trim().is_empty()) {
        record = record.with_description(description);
    }
    if let Some(image) = metadata.image.filter(|i| !i.trim().is_empty()) {
        record = record.with_image(image);
    }

    record
}

/// CryptoPanic API client
pub struct CryptoPanicClient {
    http_client: reqwest::Client,
    config: FeedConfig,
}

impl CryptoPanicClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// URL of the first page, including auth and filter parameters
    pub fn first_page_url(&self) -> Result<Url> {
        let mut params: Vec<(&str, &str)> = vec![
            ("auth_token", self.config.api_key.as_str()),
            ("public", "true"),
            ("metadata", "true"),
        ];
        if let Some(filter) = &self.config.filter {
            params.push(("filter", filter.as_str()));
        }
        if let Some(currencies) = &self.config.currencies {
            params.push(("currencies", currencies.as_str()));
        }
        if let Some(kind) = &self.config.kind {
            params.push(("kind", kind.as_str()));
        }

        Url::parse_with_params(&self.config.base_url, &params)
            .map_err(|e| Error::Config(format!("Invalid source URL '{}': {}", self.config.base_url, e)))
    }

    async fn fetch_page(&self, url: Url, page: u32) -> Result<FeedPage> {
        // Never log the query string: it carries the auth token
        tracing::debug!(page, path = %url.path(), "Querying CryptoPanic API");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable(format!(
                "feed returned status {}",
                status.as_u16()
            )));
        }

        response
            .json::<FeedPage>()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("unreadable feed page: {}", e)))
    }
}

#[async_trait]
impl NewsSource for CryptoPanicClient {
    fn name(&self) -> &'static str {
        "cryptopanic"
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        let observed_at = time::now();
        let max_pages = self.config.max_pages.max(1);

        let mut records = Vec::new();
        let mut next = Some(self.first_page_url()?);
        let mut page = 0;

        while let Some(url) = next.take() {
            page += 1;

            let feed_page = self.fetch_page(url, page).await?;
            next = match feed_page.next.as_deref() {
                Some(raw) if page < max_pages => Some(Url::parse(raw).map_err(|e| {
                    Error::SourceUnavailable(format!("invalid next link: {}", e))
                })?),
                _ => None,
            };

            records.extend(
                feed_page
                    .results
                    .into_iter()
                    .map(|post| normalize_post(post, observed_at, self.config.hot_score_threshold)),
            );
        }

        tracing::info!(
            pages = page,
            records = records.len(),
            "Retrieved posts from CryptoPanic"
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn observed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_click_url() {
        assert_eq!(click_url(12345), "https://cryptopanic.com/news/click/12345/");
    }

    #[test]
    fn test_normalize_full_post() {
        let json = r#"{
            "id": 42,
            "title": "Bitcoin hits new high",
            "published_at": "2020-01-01T00:00:00Z",
            "metadata": {"description": "Price surges", "image": "https://img/1.png"},
            "votes": {"positive": 9, "negative": 2, "important": 1}
        }"#;
        let post: FeedPost = serde_json::from_str(json).unwrap();

        let record = normalize_post(post, observed(), 5);

        assert_eq!(record.id().as_str(), "https://cryptopanic.com/news/click/42/");
        assert_eq!(record.title, "Bitcoin hits new high");
        assert_eq!(record.description.as_deref(), Some("Price surges"));
        assert_eq!(record.image.as_deref(), Some("https://img/1.png"));
        assert_eq!(record.score, 7);
        assert!(record.is_hot);
        // Upstream publication time is ignored
        assert_eq!(record.observed_at(), observed());
    }

    #[test]
    fn test_normalize_minimal_post() {
        let post: FeedPost = serde_json::from_str(r#"{"id": 7, "title": "ETH"}"#).unwrap();

        let record = normalize_post(post, observed(), 5);

        assert_eq!(record.description, None);
        assert_eq!(record.image, None);
        assert_eq!(record.score, 0);
        assert!(!record.is_hot);
    }

    #[test]
    fn test_blank_metadata_is_absent() {
        let json = r#"{"id": 7, "title": "ETH", "metadata": {"description": "  ", "image": ""}}"#;
        let post: FeedPost = serde_json::from_str(json).unwrap();

        let record = normalize_post(post, observed(), 5);

        assert_eq!(record.description, None);
        assert_eq!(record.image, None);
    }

    #[test]
    fn test_identity_ignores_title() {
        let a: FeedPost = serde_json::from_str(r#"{"id": 1, "title": "one"}"#).unwrap();
        let b: FeedPost = serde_json::from_str(r#"{"id": 1, "title": "two"}"#).unwrap();

        assert_eq!(
            normalize_post(a, observed(), 5).id(),
            normalize_post(b, observed(), 5).id()
        );
    }

    #[test]
    fn test_first_page_url_carries_params() {
        let mut config = FeedConfig::new("secret");
        config.filter = Some("hot".to_string());
        config.currencies = Some("BTC,ETH".to_string());
        let client = CryptoPanicClient::new(config).unwrap();

        let url = client.first_page_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("auth_token".to_string(), "secret".to_string())));
        assert!(pairs.contains(&("filter".to_string(), "hot".to_string())));
        assert!(pairs.contains(&("currencies".to_string(), "BTC,ETH".to_string())));
        assert!(pairs.contains(&("metadata".to_string(), "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "kind"));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let mut config = FeedConfig::new("k");
        config.base_url = "not a url".to_string();
        let client = CryptoPanicClient::new(config).unwrap();

        assert!(matches!(client.first_page_url(), Err(Error::Config(_))));
    }
}

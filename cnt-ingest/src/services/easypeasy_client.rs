//! Easy Peasy translation API client
//!
//! One request per piece of text. Retrying is the caller's job
//! (see [`crate::services::record_translator`]).

use async_trait::async_trait;
use cnt_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{TranslateError, Translator};

pub const EASYPEASY_TRANSLATE_URL: &str = "https://api.easypeasy.ai/translate";
const USER_AGENT: &str = concat!("cnt-ingest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translated_text: Option<String>,
}

/// Easy Peasy API client
pub struct EasyPeasyClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl EasyPeasyClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Translator for EasyPeasyClient {
    async fn translate(&self, text: &str, target_lang: &str) -> std::result::Result<String, TranslateError> {
        tracing::debug!(chars = text.chars().count(), target_lang, "Querying translation API");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&TranslateRequest { text, target_lang })
            .send()
            .await
            .map_err(|e| TranslateError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api(status.as_u16(), error_text));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;

        let translated = body
            .translated_text
            .ok_or_else(|| TranslateError::Malformed("missing translated_text".to_string()))?;
        if translated.trim().is_empty() && !text.trim().is_empty() {
            return Err(TranslateError::Malformed("empty translated_text".to_string()));
        }

        Ok(translated)
    }
}

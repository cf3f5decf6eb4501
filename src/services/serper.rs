use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const SERPER_BASE: &str = "https://google.serper.dev/images";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Error)]
pub enum SerperError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("empty search query")]
    EmptyQuery,
    #[error("image search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image search HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("image search JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SerperConfig {
    pub api_key: Option<String>,
    /// Optional search locale (Serper `hl` parameter).
    pub locale: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ImageSearchResponse {
    #[serde(default)]
    images: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResult {
    image_url: Option<String>,
}

#[derive(Clone)]
pub struct SerperClient {
    config: SerperConfig,
    client: reqwest::Client,
}

impl SerperClient {
    pub fn from_env() -> Self {
        Self::new(SerperConfig {
            api_key: env_string("SERPER_API_KEY"),
            locale: env_string("SERPER_HL"),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    pub fn new(config: SerperConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Search for exactly one image. `Ok(None)` is the normal
    /// zero-result outcome, not an error.
    pub async fn search_image(&self, query: &str) -> Result<Option<String>, SerperError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(SerperError::NotConfigured("SERPER_API_KEY"))?;

        let query = query.trim();
        if query.is_empty() {
            return Err(SerperError::EmptyQuery);
        }

        let mut params: Vec<(&str, &str)> =
            vec![("q", query), ("num", "1"), ("apiKey", api_key)];
        if let Some(hl) = self.config.locale.as_deref().filter(|v| !v.is_empty()) {
            params.push(("hl", hl));
        }

        let resp = self.client.get(SERPER_BASE).query(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerperError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: ImageSearchResponse = serde_json::from_slice(&bytes)?;

        Ok(parsed
            .images
            .into_iter()
            .find_map(|img| img.image_url)
            .filter(|url| !url.trim().is_empty()))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

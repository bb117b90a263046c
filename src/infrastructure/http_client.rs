//! HTTP transport for the harvester
//!
//! A [`Transport`] performs exactly one timed GET and either returns the decoded
//! JSON body or a classified [`TransportError`]. Retrying is left to
//! [`crate::infrastructure::retry_manager::RetryingFetcher`].

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::config::HarvestConfig;

/// Decoded response body
pub type RawPayload = serde_json::Value;

/// Characters of a failed response body kept for diagnostics
pub const BODY_PREVIEW_CHARS: usize = 200;

/// Statuses worth another attempt
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Failure of a single network attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Response body is not valid JSON: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) | Self::Decode(_) => true,
            Self::HttpStatus { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Single GET with a hard timeout. No retry logic of its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawPayload, TransportError>;
}

/// Keep the first [`BODY_PREVIEW_CHARS`] characters of a response body
pub fn truncate_body(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total timeout of one request, body included
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Static headers added to every request
    pub headers: BTreeMap<String, String>,
}

impl HttpClientConfig {
    /// Create HttpClientConfig from HarvestConfig
    pub fn from_harvest_config(config: &HarvestConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
            headers: config.headers.clone(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_harvest_config(&HarvestConfig::default())
    }
}

/// reqwest-backed [`Transport`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client from HarvestConfig
    pub fn from_harvest_config(config: &HarvestConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from_harvest_config(config))
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(build_default_headers(&config.headers)?)
            .gzip(true)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<RawPayload, TransportError> {
        debug!("🌐 HTTP GET: {}", url);

        let response = self.client.get(url).send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(error.to_string())
    }
}

fn build_default_headers(extra: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name: {}", name))?;
        let header_value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {}", name))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

//! HTTP boundary to the launcher backend.
//!
//! Every request is a plain `GET <base><path>` with `Accept: application/json`.
//! Failures are classified into [`FailureKind`]s so callers can report them
//! uniformly; nothing here retries.
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::news::{ingest, NewsEntry, NewsSource, WireNewsEntry};

/// Largest response body accepted from the backend.
const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

/// Error bodies are only kept for diagnostics, so cap what goes into messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("API {status} {reason}: {body}")]
    HttpStatus {
        status: u16,
        reason: String,
        body: String,
    },
    /// Body was not valid JSON of the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The configured base URL cannot be used
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request could not be completed (DNS, connection, timeout)
    Transport,
    /// The server answered with a non-2xx status
    Protocol,
    /// The body was unusable
    MalformedData,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_)
            | Self::Timeout
            | Self::IncompleteResponse { .. }
            | Self::InvalidBaseUrl { .. } => FailureKind::Transport,
            Self::HttpStatus { .. } => FailureKind::Protocol,
            Self::Malformed(_) | Self::ResponseTooLarge => FailureKind::MalformedData,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub status: String,
    /// Seconds since the backend started
    pub uptime: f64,
}

/// `GET /api/stats`. Counts come straight from `COUNT(*)`, which the backend
/// sometimes serializes as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    #[serde(deserialize_with = "count_from_string_or_number")]
    pub total_users: u64,
    #[serde(deserialize_with = "count_from_string_or_number")]
    pub online_users: u64,
}

fn count_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid count '{}'", s))),
    }
}

// ============================================================================
// ApiClient
// ============================================================================

/// Client for the launcher backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Build a client for `base_url` (trailing `/` ignored). `None` leaves
    /// requests without a timeout of their own.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url).map_err(|e| FetchError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidBaseUrl {
                url: base_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        let sep = if path.starts_with('/') { "" } else { "/" };
        format!("{}{}{}", self.base_url, sep, path)
    }

    /// GET `path` and decode the JSON body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url_for(path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            // The body is diagnostic only; a failure to read it leaves it empty.
            let body = read_limited_bytes(response, MAX_RESPONSE_SIZE)
                .await
                .map(|bytes| error_body_text(&bytes))
                .unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), "Backend returned error status");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    pub async fn health(&self) -> Result<Health, FetchError> {
        self.get_json("/health").await
    }

    pub async fn stats(&self) -> Result<GlobalStats, FetchError> {
        self.get_json("/api/stats").await
    }

    /// `GET /api/news`, normalized through [`ingest`].
    pub async fn news(&self) -> Result<Vec<NewsEntry>, FetchError> {
        let wire: Vec<WireNewsEntry> = self.get_json("/api/news").await?;
        Ok(ingest(wire))
    }
}

#[async_trait]
impl NewsSource for ApiClient {
    async fn fetch_news(&self) -> Result<Vec<NewsEntry>, FetchError> {
        self.news().await
    }
}

fn error_body_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_reqwest)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

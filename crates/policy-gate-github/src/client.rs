// crates/policy-gate-github/src/client.rs
// ============================================================================
// Module: GitHub Client
// Description: Pooled HTTP client for the GitHub REST API.
// Purpose: Issue bounded, authenticated GET requests and decode JSON replies.
// Dependencies: policy-gate-config, reqwest, serde, url
// ============================================================================

//! ## Overview
//! [`GitHubClient`] wraps one long-lived `reqwest::Client` built with connect
//! and request timeouts. Paths are assembled from individually encoded
//! segments so caller-supplied owners, refs, and file paths cannot rewrite
//! the request target. Response bodies are read under a byte limit.
//!
//! Security posture: the token is only attached as a request header and is
//! never rendered into error messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use policy_gate_config::GitHubConfig;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::ACCEPT;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Media type requested from the REST API.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
/// Maximum number of upstream error-body bytes kept in an error message.
pub(crate) const MAX_ERROR_MESSAGE_BYTES: usize = 512;

// ============================================================================
// SECTION: Client
// ============================================================================

/// GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    /// API base URL.
    api_base: Url,
    /// Optional API token.
    token: Option<String>,
    /// HTTP client configured with timeouts and default headers.
    client: Client,
    /// Maximum accepted response size in bytes.
    max_response_bytes: usize,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubClient")
            .field("api_base", &self.api_base.as_str())
            .field("authenticated", &self.token.is_some())
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidRequest`] when the base URL or client
    /// settings are unusable.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, UpstreamError> {
        Self::new(
            &config.api_base,
            config.token.clone(),
            &config.user_agent,
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.request_timeout_ms),
            config.max_response_bytes,
        )
    }

    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidRequest`] when the base URL or client
    /// settings are unusable.
    pub fn new(
        api_base: &str,
        token: Option<String>,
        user_agent: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<Self, UpstreamError> {
        let api_base = Url::parse(api_base.trim())
            .map_err(|err| UpstreamError::InvalidRequest(format!("invalid api base: {err}")))?;
        if api_base.cannot_be_a_base() {
            return Err(UpstreamError::InvalidRequest("api base cannot be a base url".to_string()));
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|err| UpstreamError::InvalidRequest(err.to_string()))?;
        Ok(Self {
            api_base,
            token: token.filter(|token| !token.is_empty()),
            client,
            max_response_bytes,
        })
    }

    /// Builds an endpoint URL from path segments and query pairs.
    ///
    /// Each segment is percent-encoded on its own; empty segments are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidRequest`] when the base URL cannot take
    /// path segments.
    pub fn endpoint(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, UpstreamError> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                UpstreamError::InvalidRequest("api base cannot be a base url".to_string())
            })?;
            path.pop_if_empty();
            path.extend(segments.iter().filter(|segment| !segment.is_empty()));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Issues a GET request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] for transport failures, non-success statuses,
    /// oversized bodies, and undecodable payloads.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = self.endpoint(segments, query)?;
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body =
                read_limited(response, MAX_ERROR_MESSAGE_BYTES * 8).await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        let body = read_limited(response, self.max_response_bytes).await?;
        serde_json::from_slice(&body).map_err(|err| UpstreamError::Decode(err.to_string()))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upstream request failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status.
    #[error("upstream status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Upstream error message, truncated.
        message: String,
    },
    /// Connection, TLS, or timeout failure.
    #[error("upstream transport error: {0}")]
    Transport(String),
    /// Response body exceeded the configured limit.
    #[error("upstream response exceeds {limit} bytes")]
    ResponseTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
    /// Response body could not be decoded.
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
    /// Request could not be constructed.
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

impl UpstreamError {
    /// Returns the upstream status code when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status {
                status,
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a reqwest failure into a transport error without the request URL.
fn transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Transport("request timed out".to_string())
    } else if err.is_connect() {
        UpstreamError::Transport("connection failed".to_string())
    } else {
        UpstreamError::Transport(err.without_url().to_string())
    }
}

/// Reads a response body, failing once it exceeds `limit` bytes.
async fn read_limited(mut response: Response, limit: usize) -> Result<Vec<u8>, UpstreamError> {
    if response.content_length().is_some_and(|length| length > limit as u64) {
        return Err(UpstreamError::ResponseTooLarge {
            limit,
        });
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
        if body.len() + chunk.len() > limit {
            return Err(UpstreamError::ResponseTooLarge {
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Extracts a readable message from an upstream error body.
pub(crate) fn error_message(body: &[u8]) -> String {
    let parsed = serde_json::from_slice::<serde_json::Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| String::from_utf8_lossy(body).into_owned(), str::to_string);
    truncate_utf8(message.trim(), MAX_ERROR_MESSAGE_BYTES)
}

/// Truncates text to at most `max` bytes on a character boundary.
pub(crate) fn truncate_utf8(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[.. end].to_string()
}

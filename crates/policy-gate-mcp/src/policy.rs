// crates/policy-gate-mcp/src/policy.rs
// ============================================================================
// Module: Policy Service Client
// Description: Client for the external policy decision service.
// Purpose: Obtain a verdict for a tool-call descriptor or fail loudly.
// Dependencies: policy-gate-core, policy-gate-config, reqwest, async-trait
// ============================================================================

//! ## Overview
//! The gateway asks a [`PolicyClient`] for a verdict on each descriptor.
//! [`HttpPolicyClient`] speaks the OPA data API convention: it posts
//! `{"input": {"tool_call": <descriptor>}}` to a decision endpoint and reads
//! the `result` field of the reply. Transport failures, timeouts, non-success
//! statuses, and unreadable bodies are errors, never denials.
//!
//! Security posture: policy responses are untrusted and size-limited; their
//! contents are never echoed back to callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use policy_gate_config::PolicyServiceConfig;
use policy_gate_core::PolicyDecision;
use policy_gate_core::ToolCallDescriptor;
use reqwest::Client;
use reqwest::Response;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Public Types
// ============================================================================

/// Policy decision interface.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Returns the verdict for a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyServiceError`] when no verdict could be obtained.
    async fn evaluate(
        &self,
        descriptor: &ToolCallDescriptor,
    ) -> Result<PolicyDecision, PolicyServiceError>;
}

/// OPA-style HTTP policy client.
pub struct HttpPolicyClient {
    /// Decision endpoint.
    url: Url,
    /// HTTP client configured with timeouts.
    client: Client,
    /// Maximum accepted response size in bytes.
    max_response_bytes: usize,
}

impl fmt::Debug for HttpPolicyClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpPolicyClient")
            .field("url", &self.url.as_str())
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl HttpPolicyClient {
    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyServiceError::Transport`] when the client cannot be
    /// built.
    pub fn from_config(config: &PolicyServiceConfig) -> Result<Self, PolicyServiceError> {
        Self::new(
            &config.url,
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.request_timeout_ms),
            config.max_response_bytes,
        )
    }

    /// Builds a new policy client.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyServiceError::Transport`] when the URL is invalid or the
    /// client cannot be built.
    pub fn new(
        url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<Self, PolicyServiceError> {
        let url = Url::parse(url.trim())
            .map_err(|err| PolicyServiceError::Transport(format!("invalid policy url: {err}")))?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|err| PolicyServiceError::Transport(err.to_string()))?;
        Ok(Self {
            url,
            client,
            max_response_bytes,
        })
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn evaluate(
        &self,
        descriptor: &ToolCallDescriptor,
    ) -> Result<PolicyDecision, PolicyServiceError> {
        let body = PolicyQuery {
            input: PolicyInput {
                tool_call: descriptor,
            },
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PolicyServiceError::Status(status.as_u16()));
        }
        let bytes = read_limited(response, self.max_response_bytes).await?;
        PolicyDecision::from_response_body(&bytes)
            .map_err(|err| PolicyServiceError::MalformedResponse(err.0))
    }
}

/// Request body sent to the decision endpoint.
#[derive(Serialize)]
struct PolicyQuery<'a> {
    /// Policy input document.
    input: PolicyInput<'a>,
}

/// Policy input document.
#[derive(Serialize)]
struct PolicyInput<'a> {
    /// Descriptor under evaluation.
    tool_call: &'a ToolCallDescriptor,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures to obtain a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyServiceError {
    /// Connection failure or client construction failure.
    #[error("policy service unreachable: {0}")]
    Transport(String),
    /// Request exceeded the configured timeout.
    #[error("policy service timed out")]
    Timeout,
    /// Non-success HTTP status.
    #[error("policy service returned status {0}")]
    Status(u16),
    /// Body was not a JSON object.
    #[error("malformed policy response: {0}")]
    MalformedResponse(String),
    /// Body exceeded the configured limit.
    #[error("policy response exceeds {limit} bytes")]
    ResponseTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a reqwest failure into a policy-service error.
fn transport_error(err: reqwest::Error) -> PolicyServiceError {
    if err.is_timeout() {
        PolicyServiceError::Timeout
    } else if err.is_connect() {
        PolicyServiceError::Transport("connection failed".to_string())
    } else {
        PolicyServiceError::Transport(err.without_url().to_string())
    }
}

/// Reads a response body, failing once it exceeds `limit` bytes.
async fn read_limited(mut response: Response, limit: usize) -> Result<Vec<u8>, PolicyServiceError> {
    if response.content_length().is_some_and(|length| length > limit as u64) {
        return Err(PolicyServiceError::ResponseTooLarge {
            limit,
        });
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
        if body.len() + chunk.len() > limit {
            return Err(PolicyServiceError::ResponseTooLarge {
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

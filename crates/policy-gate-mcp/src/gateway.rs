// crates/policy-gate-mcp/src/gateway.rs
// ============================================================================
// Module: Policy Gateway
// Description: Axum middleware that gates tool calls on a policy verdict.
// Purpose: Forward, deny, or fail each tool-call request exactly once.
// Dependencies: policy-gate-core, policy-gate-config, axum
// ============================================================================

//! ## Overview
//! [`PolicyGateway`] intercepts every inbound request. Requests without the
//! tool-call header pass through untouched. For the rest, the header value
//! is decoded into a [`ToolCallDescriptor`], the policy service is asked for
//! a verdict, and the request is either forwarded with a [`GatedToolCall`]
//! extension or short-circuited:
//!
//! | Outcome | Status | Body |
//! |---|---|---|
//! | deny | 403 | fixed denial message |
//! | decode error | 500 | decode failure reason |
//! | policy-service error | 502 | policy-service failure reason |
//!
//! The verdict is always obtained before the inner service runs. Dropping the
//! inbound connection drops the middleware future, which abandons any
//! in-flight policy call.
//!
//! Security posture: the header is untrusted and size-limited; policy
//! response bodies and tool arguments never reach the client or the audit log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use policy_gate_config::GatewayConfig;
use policy_gate_core::DecodeError;
use policy_gate_core::GatewayError;
use policy_gate_core::GatewayOutcome;
use policy_gate_core::GatewayStage;
use policy_gate_core::ToolCallDescriptor;
use serde::Serialize;

use crate::audit::AuditSink;
use crate::audit::GatewayAuditEvent;
use crate::policy::PolicyClient;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed message returned for policy denials.
pub const DENIAL_MESSAGE: &str = "Request denied by policy.";

/// Header carrying the caller-supplied request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum accepted request identifier length.
const MAX_REQUEST_ID_BYTES: usize = 128;

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Descriptor approved by the policy service, attached to forwarded requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedToolCall(pub ToolCallDescriptor);

/// Policy gateway state shared by the middleware.
pub struct PolicyGateway {
    /// Policy decision client.
    client: Arc<dyn PolicyClient>,
    /// Tool-call header name.
    header: HeaderName,
    /// Maximum encoded descriptor size.
    max_header_bytes: usize,
    /// Audit sink for gateway outcomes.
    audit: Arc<dyn AuditSink>,
}

impl PolicyGateway {
    /// Builds a gateway from its parts.
    #[must_use]
    pub fn new(
        client: Arc<dyn PolicyClient>,
        header: HeaderName,
        max_header_bytes: usize,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            client,
            header,
            max_header_bytes,
            audit,
        }
    }

    /// Builds a gateway from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when the header name is invalid.
    pub fn from_config(
        client: Arc<dyn PolicyClient>,
        config: &GatewayConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, GatewayError> {
        let header = HeaderName::from_bytes(config.tool_call_header.as_bytes())
            .map_err(|_| GatewayError::Internal("invalid tool call header name".to_string()))?;
        Ok(Self::new(client, header, config.max_header_bytes, audit))
    }

    /// Returns the tool-call header name.
    #[must_use]
    pub const fn header_name(&self) -> &HeaderName {
        &self.header
    }

    /// Gates a request by its headers. Returns `None` when the tool-call
    /// header is absent and the request is not subject to policy.
    pub async fn evaluate(&self, headers: &HeaderMap) -> Option<GatewayOutcome> {
        let mut values = headers.get_all(&self.header).iter();
        let first = values.next()?;
        if values.next().is_some() {
            return Some(GatewayOutcome::Error(DecodeError::Repeated.into()));
        }
        Some(self.evaluate_raw(first.as_bytes()).await)
    }

    /// Decodes a raw header value and obtains a verdict for it.
    pub async fn evaluate_raw(&self, raw: &[u8]) -> GatewayOutcome {
        match ToolCallDescriptor::decode(raw, self.max_header_bytes) {
            Ok(descriptor) => self.decide(descriptor).await,
            Err(err) => GatewayOutcome::Error(err.into()),
        }
    }

    /// Asks the policy service for a verdict on a decoded descriptor.
    pub async fn decide(&self, descriptor: ToolCallDescriptor) -> GatewayOutcome {
        match self.client.evaluate(&descriptor).await {
            Ok(decision) => GatewayOutcome::from_decision(descriptor, decision),
            Err(err) => GatewayOutcome::Error(GatewayError::PolicyService(err.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Error body returned for rejected requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Client-facing message.
    error: String,
}

/// Axum middleware enforcing the policy verdict on tool-call requests.
pub async fn enforce_policy(
    State(gateway): State<Arc<PolicyGateway>>,
    mut request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let Some(outcome) = gateway.evaluate(request.headers()).await else {
        return next.run(request).await;
    };
    let rejection = rejection(&outcome);
    gateway.audit.record_gateway(&GatewayAuditEvent::from_outcome(
        &outcome,
        request_id(request.headers()),
        request.uri().path(),
        rejection.as_ref().map(|(status, _)| status.as_u16()),
        started.elapsed().as_millis(),
    ));
    if let Some((status, message)) = rejection {
        return (
            status,
            Json(ErrorBody {
                error: message,
            }),
        )
            .into_response();
    }
    if let GatewayOutcome::Forward {
        descriptor,
        ..
    } = outcome
    {
        request.extensions_mut().insert(GatedToolCall(descriptor));
    }
    next.run(request).await
}

/// Returns the status and client message for a rejected outcome, or `None`
/// when the request is forwarded.
#[must_use]
pub fn rejection(outcome: &GatewayOutcome) -> Option<(StatusCode, String)> {
    match outcome {
        GatewayOutcome::Forward {
            ..
        } => None,
        GatewayOutcome::Deny {
            ..
        } => Some((StatusCode::FORBIDDEN, DENIAL_MESSAGE.to_string())),
        GatewayOutcome::Error(err) => Some(match err.stage() {
            GatewayStage::PolicyService => {
                (StatusCode::BAD_GATEWAY, format!("Policy service error: {err}"))
            }
            GatewayStage::Decode | GatewayStage::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Policy check failed: {err}"))
            }
        }),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a printable, bounded request identifier.
pub(crate) fn request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if value.is_empty()
        || value.len() > MAX_REQUEST_ID_BYTES
        || !value.bytes().all(|byte| byte.is_ascii_graphic())
    {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests;

// crates/policy-gate-mcp/src/gateway/tests.rs
// ============================================================================
// Module: Policy Gateway Tests
// Description: Unit tests for header gating and rejection mapping.
// Purpose: Validate the forward/deny/error split without a network.
// Dependencies: policy-gate-mcp, tokio
// ============================================================================

//! ## Overview
//! Exercises [`PolicyGateway::evaluate`] with an in-memory policy client and
//! checks the status/message pair produced for each outcome.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use policy_gate_config::GatewayConfig;
use policy_gate_core::DecodeError;
use policy_gate_core::GatewayError;
use policy_gate_core::GatewayOutcome;
use policy_gate_core::PolicyDecision;
use policy_gate_core::ToolCallDescriptor;

use super::DENIAL_MESSAGE;
use super::PolicyGateway;
use super::rejection;
use super::request_id;
use crate::audit::NoopAuditSink;
use crate::policy::PolicyClient;
use crate::policy::PolicyServiceError;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

struct StubPolicy {
    verdict: Result<PolicyDecision, PolicyServiceError>,
    seen: Mutex<Vec<ToolCallDescriptor>>,
}

impl StubPolicy {
    fn new(verdict: Result<PolicyDecision, PolicyServiceError>) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl PolicyClient for StubPolicy {
    async fn evaluate(
        &self,
        descriptor: &ToolCallDescriptor,
    ) -> Result<PolicyDecision, PolicyServiceError> {
        self.seen.lock().unwrap().push(descriptor.clone());
        self.verdict.clone()
    }
}

const HEADER: &str = "x-mcp-tool-call";
const REPO_INFO: &str = r#"{"tool":"get_repo_info","arguments":{"owner":"a","repo":"b"}}"#;

fn gateway(policy: &Arc<StubPolicy>) -> PolicyGateway {
    let client: Arc<dyn PolicyClient> = policy.clone();
    PolicyGateway::new(client, HeaderName::from_static(HEADER), 256, Arc::new(NoopAuditSink))
}

fn headers_with(values: &[&str]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for value in values {
        headers.append(HEADER, HeaderValue::from_str(value).unwrap());
    }
    headers
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

#[tokio::test]
async fn absent_header_is_not_gated() {
    let policy = StubPolicy::new(Ok(PolicyDecision::allow()));
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    assert!(gateway(&policy).evaluate(&headers).await.is_none());
    assert_eq!(policy.calls(), 0);
}

#[tokio::test]
async fn allowed_descriptor_is_forwarded_as_decoded() {
    let policy = StubPolicy::new(Ok(PolicyDecision::allow()));
    let outcome = gateway(&policy).evaluate(&headers_with(&[REPO_INFO])).await.unwrap();
    let GatewayOutcome::Forward {
        descriptor,
        decision,
    } = outcome
    else {
        panic!("expected forward, got {}", outcome.label());
    };
    assert!(decision.allowed);
    assert_eq!(descriptor.tool, "get_repo_info");
    assert_eq!(descriptor.arguments.get("owner"), Some(&serde_json::json!("a")));
    assert_eq!(policy.seen.lock().unwrap().as_slice(), &[descriptor]);
}

#[tokio::test]
async fn denied_descriptor_is_denied() {
    let policy = StubPolicy::new(Ok(PolicyDecision::deny()));
    let outcome = gateway(&policy).evaluate(&headers_with(&[REPO_INFO])).await.unwrap();
    assert_eq!(outcome.label(), "deny");
    assert_eq!(policy.calls(), 1);
}

#[tokio::test]
async fn malformed_header_never_reaches_policy() {
    let policy = StubPolicy::new(Ok(PolicyDecision::allow()));
    for raw in ["{not json", "[]", r#"{"tool":"x"}"#, r#"{"tool":"x","arguments":[]}"#, " "] {
        let outcome = gateway(&policy).evaluate(&headers_with(&[raw])).await.unwrap();
        assert!(
            matches!(outcome, GatewayOutcome::Error(GatewayError::Decode(_))),
            "raw {raw} gave {}",
            outcome.label()
        );
    }
    assert_eq!(policy.calls(), 0);
}

#[tokio::test]
async fn repeated_header_is_a_decode_error() {
    let policy = StubPolicy::new(Ok(PolicyDecision::allow()));
    let outcome = gateway(&policy).evaluate(&headers_with(&[REPO_INFO, REPO_INFO])).await;
    assert_eq!(outcome, Some(GatewayOutcome::Error(GatewayError::Decode(DecodeError::Repeated))));
    assert_eq!(policy.calls(), 0);
}

#[tokio::test]
async fn oversized_header_is_a_decode_error() {
    let policy = StubPolicy::new(Ok(PolicyDecision::allow()));
    let raw = format!(r#"{{"tool":"get_repo_info","arguments":{{"pad":"{}"}}}}"#, "x".repeat(300));
    let outcome = gateway(&policy).evaluate(&headers_with(&[&raw])).await.unwrap();
    assert!(matches!(
        outcome,
        GatewayOutcome::Error(GatewayError::Decode(DecodeError::TooLarge {
            limit: 256,
            ..
        }))
    ));
    assert_eq!(policy.calls(), 0);
}

#[tokio::test]
async fn policy_failure_is_an_error_not_a_denial() {
    let policy = StubPolicy::new(Err(PolicyServiceError::Status(503)));
    let outcome = gateway(&policy).evaluate(&headers_with(&[REPO_INFO])).await.unwrap();
    assert_eq!(
        outcome,
        GatewayOutcome::Error(GatewayError::PolicyService(
            "policy service returned status 503".to_string()
        ))
    );
}

#[tokio::test]
async fn repeated_evaluations_are_independent() {
    let policy = StubPolicy::new(Ok(PolicyDecision::allow()));
    let gateway = gateway(&policy);
    for _ in 0..3 {
        let outcome = gateway.evaluate(&headers_with(&[REPO_INFO])).await.unwrap();
        assert_eq!(outcome.label(), "forward");
    }
    assert_eq!(policy.calls(), 3);
}

#[test]
fn from_config_rejects_invalid_header_name() {
    let policy: Arc<dyn PolicyClient> = StubPolicy::new(Ok(PolicyDecision::allow()));
    let config = GatewayConfig {
        tool_call_header: "bad header".to_string(),
        ..GatewayConfig::default()
    };
    assert!(PolicyGateway::from_config(policy, &config, Arc::new(NoopAuditSink)).is_err());
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn rejection_maps_each_outcome() {
    let descriptor = ToolCallDescriptor::new("get_branches", serde_json::Map::new());
    let forward = GatewayOutcome::from_decision(descriptor.clone(), PolicyDecision::allow());
    assert!(rejection(&forward).is_none());

    let deny = GatewayOutcome::from_decision(descriptor, PolicyDecision::deny());
    assert_eq!(rejection(&deny), Some((StatusCode::FORBIDDEN, DENIAL_MESSAGE.to_string())));

    let decode = GatewayOutcome::Error(DecodeError::Empty.into());
    assert_eq!(
        rejection(&decode),
        Some((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Policy check failed: invalid tool call header: tool call header is empty".to_string()
        ))
    );

    let service = GatewayOutcome::Error(GatewayError::PolicyService(
        PolicyServiceError::Timeout.to_string(),
    ));
    assert_eq!(
        rejection(&service),
        Some((
            StatusCode::BAD_GATEWAY,
            "Policy service error: policy service timed out".to_string()
        ))
    );
}

#[test]
fn request_id_is_sanitized() {
    let mut headers = HeaderMap::new();
    assert_eq!(request_id(&headers), None);
    headers.insert("x-request-id", HeaderValue::from_static("req-1"));
    assert_eq!(request_id(&headers).as_deref(), Some("req-1"));
    headers.insert("x-request-id", HeaderValue::from_static("has space"));
    assert_eq!(request_id(&headers), None);
    headers.insert("x-request-id", HeaderValue::from_str(&"r".repeat(200)).unwrap());
    assert_eq!(request_id(&headers), None);
}

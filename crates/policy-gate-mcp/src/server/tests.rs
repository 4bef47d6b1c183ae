// crates/policy-gate-mcp/src/server/tests.rs
// ============================================================================
// Module: MCP Server Unit Tests
// Description: Unit tests for JSON-RPC error mapping and server helpers.
// Purpose: Pin status codes and error codes for each routing failure.
// Dependencies: policy-gate-mcp, tempfile
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use axum::http::StatusCode;
use policy_gate_config::CorsConfig;
use policy_gate_config::ServerAuditConfig;
use serde_json::Value;
use serde_json::json;

use super::JsonRpcResponse;
use super::build_audit_sink;
use super::cors_layer;
use super::is_valid_host;
use super::jsonrpc_error;
use crate::tools::RouterError;

#[test]
fn router_errors_map_to_jsonrpc_codes() {
    let cases = [
        (RouterError::Unauthenticated("x".to_string()), StatusCode::UNAUTHORIZED, -32001),
        (RouterError::Unauthorized("x".to_string()), StatusCode::FORBIDDEN, -32003),
        (RouterError::UnknownTool("x".to_string()), StatusCode::BAD_REQUEST, -32601),
        (RouterError::InvalidParams("x".to_string()), StatusCode::BAD_REQUEST, -32602),
        (RouterError::Serialization("x".to_string()), StatusCode::OK, -32060),
    ];
    for (error, status, code) in cases {
        let (actual_status, response) = jsonrpc_error(json!(1), error);
        assert_eq!(actual_status, status);
        assert_eq!(response.error.map(|error| error.code), Some(code));
    }
}

#[test]
fn unauthenticated_message_hides_reason() {
    let (_, response) = jsonrpc_error(
        json!(7),
        RouterError::Unauthenticated("invalid bearer token".to_string()),
    );
    assert_eq!(response.error.unwrap().message, "unauthenticated");
}

#[test]
fn response_outcome_labels() {
    assert_eq!(JsonRpcResponse::success(json!(1), json!({"isError": false})).outcome(), "ok");
    let tool_error = JsonRpcResponse::success(json!(1), json!({"isError": true}));
    assert_eq!(tool_error.outcome(), "tool_error");
    assert_eq!(JsonRpcResponse::failure(json!(1), -32601, "nope").outcome(), "error");
}

#[test]
fn failure_serializes_without_result() {
    let value = serde_json::to_value(JsonRpcResponse::failure(Value::Null, -32600, "bad")).unwrap();
    assert_eq!(
        value,
        json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "bad"}})
    );
}

#[test]
fn host_validation_rejects_injection() {
    assert!(is_valid_host("127.0.0.1:8000"));
    assert!(is_valid_host("[::1]:8000"));
    assert!(is_valid_host("gate.example.com"));
    assert!(!is_valid_host(""));
    assert!(!is_valid_host("evil.com/\"x"));
    assert!(!is_valid_host("a b"));
}

#[test]
fn cors_layer_follows_configuration() {
    assert!(cors_layer(&CorsConfig::default()).unwrap().is_none());
    let any = CorsConfig {
        allowed_origins: vec!["*".to_string()],
    };
    assert!(cors_layer(&any).unwrap().is_some());
    let listed = CorsConfig {
        allowed_origins: vec!["https://app.example.com".to_string()],
    };
    assert!(cors_layer(&listed).unwrap().is_some());
    let invalid = CorsConfig {
        allowed_origins: vec!["bad\norigin".to_string()],
    };
    assert!(cors_layer(&invalid).is_err());
}

#[test]
fn audit_sink_honors_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let config = ServerAuditConfig {
        enabled: true,
        path: Some(path.display().to_string()),
    };
    assert!(build_audit_sink(&config).is_ok());
    assert!(path.exists());

    let missing = ServerAuditConfig {
        enabled: true,
        path: Some(dir.path().join("missing/dir/audit.jsonl").display().to_string()),
    };
    assert!(build_audit_sink(&missing).is_err());

    let disabled = ServerAuditConfig {
        enabled: false,
        path: Some(dir.path().join("missing/dir/audit.jsonl").display().to_string()),
    };
    assert!(build_audit_sink(&disabled).is_ok());
}

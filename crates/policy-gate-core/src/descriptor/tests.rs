// crates/policy-gate-core/src/descriptor/tests.rs
// ============================================================================
// Module: Tool Call Descriptor Unit Tests
// Description: Unit tests for strict descriptor decoding.
// Purpose: Validate fail-closed decoding of untrusted header payloads.
// Dependencies: policy-gate-core
// ============================================================================

//! ## Overview
//! Exercises descriptor decoding against well-formed and malformed payloads.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;

use super::DecodeError;
use super::ToolCallDescriptor;
use crate::tooling::ToolName;

const LIMIT: usize = super::DEFAULT_MAX_DESCRIPTOR_BYTES;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn decodes_well_formed_descriptor() {
    let raw = br#"{"tool":"get_repo_info","arguments":{"owner":"a","repo":"b"}}"#;
    let descriptor = ToolCallDescriptor::decode(raw, LIMIT).unwrap();
    assert_eq!(descriptor.tool, "get_repo_info");
    assert_eq!(descriptor.tool_name(), Some(ToolName::GetRepoInfo));
    assert_eq!(descriptor.arguments.get("owner"), Some(&json!("a")));
    assert_eq!(descriptor.arguments.get("repo"), Some(&json!("b")));
}

#[test]
fn accepts_empty_arguments_object() {
    let raw = br#"{"tool":"get_branches","arguments":{}}"#;
    let descriptor = ToolCallDescriptor::decode(raw, LIMIT).unwrap();
    assert!(descriptor.arguments.is_empty());
}

#[test]
fn keeps_unknown_tool_names_for_policy_evaluation() {
    let raw = br#"{"tool":"delete_repo","arguments":{}}"#;
    let descriptor = ToolCallDescriptor::decode(raw, LIMIT).unwrap();
    assert_eq!(descriptor.tool, "delete_repo");
    assert_eq!(descriptor.tool_name(), None);
}

#[test]
fn rejects_empty_payload() {
    assert_eq!(ToolCallDescriptor::decode(b"", LIMIT), Err(DecodeError::Empty));
    assert_eq!(ToolCallDescriptor::decode(b"   ", LIMIT), Err(DecodeError::Empty));
}

#[test]
fn rejects_invalid_json() {
    let result = ToolCallDescriptor::decode(b"{tool: get_repo_info}", LIMIT);
    assert!(matches!(result, Err(DecodeError::Syntax(_))));
}

#[test]
fn rejects_non_object_json() {
    let result = ToolCallDescriptor::decode(b"[\"get_repo_info\"]", LIMIT);
    assert_eq!(result, Err(DecodeError::NotAnObject));
    let result = ToolCallDescriptor::decode(b"\"get_repo_info\"", LIMIT);
    assert_eq!(result, Err(DecodeError::NotAnObject));
}

#[test]
fn rejects_missing_arguments() {
    let result = ToolCallDescriptor::decode(br#"{"tool":"get_repo_info"}"#, LIMIT);
    assert!(matches!(result, Err(DecodeError::Schema(_))));
}

#[test]
fn rejects_missing_tool() {
    let result = ToolCallDescriptor::decode(br#"{"arguments":{}}"#, LIMIT);
    assert!(matches!(result, Err(DecodeError::Schema(_))));
}

#[test]
fn rejects_mistyped_fields() {
    let cases: [&[u8]; 4] = [
        br#"{"tool":7,"arguments":{}}"#,
        br#"{"tool":"get_repo_info","arguments":[]}"#,
        br#"{"tool":"get_repo_info","arguments":null}"#,
        br#"{"tool":null,"arguments":{}}"#,
    ];
    for raw in cases {
        let result = ToolCallDescriptor::decode(raw, LIMIT);
        assert!(matches!(result, Err(DecodeError::Schema(_))), "accepted {raw:?}");
    }
}

#[test]
fn rejects_unknown_fields() {
    let raw = br#"{"tool":"get_repo_info","arguments":{},"allow":true}"#;
    let result = ToolCallDescriptor::decode(raw, LIMIT);
    assert!(matches!(result, Err(DecodeError::Schema(_))));
}

#[test]
fn rejects_blank_tool_name() {
    let result = ToolCallDescriptor::decode(br#"{"tool":"","arguments":{}}"#, LIMIT);
    assert!(matches!(result, Err(DecodeError::Schema(_))));
    let result = ToolCallDescriptor::decode(br#"{"tool":" get_branches","arguments":{}}"#, LIMIT);
    assert!(matches!(result, Err(DecodeError::Schema(_))));
}

#[test]
fn rejects_oversized_payload() {
    let raw = br#"{"tool":"get_repo_info","arguments":{"owner":"a","repo":"b"}}"#;
    let result = ToolCallDescriptor::decode(raw, raw.len() - 1);
    assert_eq!(
        result,
        Err(DecodeError::TooLarge {
            actual: raw.len(),
            limit: raw.len() - 1,
        })
    );
    assert!(ToolCallDescriptor::decode(raw, raw.len()).is_ok());
}

#[test]
fn rejects_invalid_utf8() {
    let result = ToolCallDescriptor::decode(&[0x7b, 0xff, 0x7d], LIMIT);
    assert_eq!(result, Err(DecodeError::NotUtf8));
}

#[test]
fn matches_call_compares_name_and_arguments() {
    let raw = br#"{"tool":"get_repo_info","arguments":{"owner":"a","repo":"b"}}"#;
    let descriptor = ToolCallDescriptor::decode(raw, LIMIT).unwrap();
    assert!(descriptor.matches_call("get_repo_info", &json!({"repo": "b", "owner": "a"})));
    assert!(!descriptor.matches_call("get_branches", &json!({"owner": "a", "repo": "b"})));
    assert!(!descriptor.matches_call("get_repo_info", &json!({"owner": "a", "repo": "c"})));
    assert!(!descriptor.matches_call("get_repo_info", &json!({"owner": "a"})));
    assert!(!descriptor.matches_call("get_repo_info", &json!("owner=a")));
}

#[test]
fn matches_call_treats_null_arguments_as_empty() {
    let descriptor = ToolCallDescriptor::decode(br#"{"tool":"x","arguments":{}}"#, LIMIT).unwrap();
    assert!(descriptor.matches_call("x", &serde_json::Value::Null));
}

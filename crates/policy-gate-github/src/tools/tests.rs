// crates/policy-gate-github/src/tools/tests.rs
// ============================================================================
// Module: GitHub Tools Unit Tests
// Description: Unit tests for argument decoding and field checks.
// Purpose: Ensure invalid arguments never reach the upstream API.
// Dependencies: policy-gate-github
// ============================================================================

//! ## Overview
//! Argument decoding is exercised without network access.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use policy_gate_core::ToolName;
use policy_gate_core::types::FileContentArgs;
use policy_gate_core::types::RecentCommitsArgs;
use policy_gate_core::types::RepoArgs;
use policy_gate_core::types::SearchArgs;
use policy_gate_core::types::UserReposArgs;
use serde_json::Value;
use serde_json::json;

use super::ToolError;
use super::parse_args;
use crate::client::UpstreamError;

#[test]
fn defaults_fill_optional_fields() {
    let args: RecentCommitsArgs = parse_args(json!({"owner": "octo", "repo": "hello"})).unwrap();
    assert_eq!(args.count, 10);
    assert_eq!(args.branch, "main");
    let args: SearchArgs = parse_args(json!({"query": "mcp"})).unwrap();
    assert_eq!(args.language, "");
    assert_eq!(args.sort, "updated");
    let args: UserReposArgs = parse_args(json!({"username": "octo"})).unwrap();
    assert_eq!(args.repo_type, "all");
}

#[test]
fn null_arguments_decode_as_empty_object() {
    let err = parse_args::<RepoArgs>(Value::Null).unwrap_err();
    let ToolError::InvalidParams(message) = err else {
        panic!("expected invalid params");
    };
    assert!(message.contains("missing field"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = parse_args::<RepoArgs>(json!({"owner": "o", "repo": "r", "path": "x"})).unwrap_err();
    assert!(matches!(err, ToolError::InvalidParams(_)));
}

#[test]
fn blank_required_fields_are_rejected() {
    let err = parse_args::<RepoArgs>(json!({"owner": "  ", "repo": "r"})).unwrap_err();
    assert_eq!(err.to_string(), "invalid params: owner is invalid");
    let err = parse_args::<SearchArgs>(json!({"query": ""})).unwrap_err();
    assert_eq!(err.to_string(), "invalid params: query is invalid");
}

#[test]
fn file_path_must_be_canonical() {
    let args = |path: &str| json!({"owner": "o", "repo": "r", "file_path": path});
    for path in ["..", "a/..", "./a", "a/.", "/a", "a/", "a//b"] {
        let err = parse_args::<FileContentArgs>(args(path)).unwrap_err();
        assert_eq!(err.to_string(), "invalid params: file_path is invalid", "{path}");
    }
    let parsed = parse_args::<FileContentArgs>(args("docs/.github/a..b.md")).unwrap();
    assert_eq!(parsed.file_path, "docs/.github/a..b.md");
}

#[test]
fn user_repo_type_must_be_known() {
    let err =
        parse_args::<UserReposArgs>(json!({"username": "octo", "type": "forks"})).unwrap_err();
    assert_eq!(err.to_string(), "invalid params: type is invalid");
}

#[test]
fn wrong_json_types_are_rejected() {
    let args = json!({"owner": "o", "repo": "r", "count": "5"});
    let err = parse_args::<RecentCommitsArgs>(args).unwrap_err();
    assert!(matches!(err, ToolError::InvalidParams(_)));
}

#[test]
fn upstream_errors_name_the_tool() {
    let err = ToolError::Upstream {
        tool: ToolName::GetRepoInfo,
        source: UpstreamError::Status {
            status: 404,
            message: "Not Found".to_string(),
        },
    };
    assert_eq!(err.to_string(), "get_repo_info: upstream status 404: Not Found");
}

// crates/policy-gate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests running the `policy-gate` binary.
// Purpose: Ensure config, policy check, and serve guards fail closed.
// Dependencies: policy-gate-cli binary, tempfile, tiny_http
// ============================================================================

//! ## Overview
//! Runs the CLI binary in a scratch directory with a clean environment.
//! Policy checks talk to an in-process `tiny_http` policy stub.

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

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::thread;

use serde_json::Value;
use tempfile::TempDir;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn policy_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_policy-gate"))
}

/// Runs the binary from `dir` with gateway-related environment cleared.
fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(policy_gate_bin())
        .current_dir(dir)
        .env_remove("POLICY_GATE_CONFIG")
        .env_remove("POLICY_GATE_POLICY_URL")
        .env_remove("POLICY_GATE_BIND")
        .env_remove("POLICY_GATE_ALLOW_NON_LOOPBACK")
        .args(args)
        .output()
        .expect("run policy-gate")
}

fn write_config(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("policy-gate.toml");
    fs::write(&path, contents.trim()).expect("write config");
    path.display().to_string()
}

/// Answers one policy request with `body`; returns the policy URL.
fn spawn_policy(body: &'static str) -> (String, thread::JoinHandle<Option<String>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut request = server.recv().ok()?;
        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).ok()?;
        let _ = request.respond(Response::from_string(body));
        Some(received)
    });
    (format!("http://{addr}/v1/data/policies/main"), handle)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ============================================================================
// SECTION: Config
// ============================================================================

#[test]
fn config_validate_accepts_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[server]\nbind = \"127.0.0.1:0\"\n");
    let output = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Config valid");
}

#[test]
fn config_validate_rejects_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[server]\ntransport = \"http\"\n");
    let output = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load config"), "stderr: {}", stderr(&output));
}

#[test]
fn config_example_validates() {
    let dir = tempfile::tempdir().unwrap();
    let example = run(dir.path(), &["config", "example"]);
    assert!(example.status.success());
    let path = write_config(&dir, &String::from_utf8_lossy(&example.stdout));
    let output = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn dotenv_file_supplies_overrides() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "POLICY_GATE_BIND=not-an-address\n").unwrap();
    let output = run(dir.path(), &["config", "validate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("server.bind"), "stderr: {}", stderr(&output));
}

// ============================================================================
// SECTION: Tools
// ============================================================================

#[test]
fn tools_list_prints_definitions() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["tools", "list"]);
    assert!(output.status.success());
    let tools: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> =
        tools.as_array().unwrap().iter().filter_map(|tool| tool["name"].as_str()).collect();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&"get_repo_info"));
}

// ============================================================================
// SECTION: Policy Check
// ============================================================================

#[test]
fn policy_check_reports_forward() {
    let dir = tempfile::tempdir().unwrap();
    let (url, handle) = spawn_policy(r#"{"result": true, "decision_id": "d-1"}"#);
    let path = write_config(&dir, &format!("[policy]\nurl = \"{url}\"\n"));
    let output = run(
        dir.path(),
        &[
            "policy",
            "check",
            "--config",
            &path,
            "--tool-call",
            r#"{"tool":"get_repo_info","arguments":{"owner":"a","repo":"b"}}"#,
        ],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "forward");
    assert!(stderr(&output).contains("decision_id: d-1"));

    let received: Value = serde_json::from_str(&handle.join().unwrap().unwrap()).unwrap();
    assert_eq!(received["input"]["tool_call"]["tool"], "get_repo_info");
    assert_eq!(received["input"]["tool_call"]["arguments"]["repo"], "b");
}

#[test]
fn policy_check_reports_deny() {
    let dir = tempfile::tempdir().unwrap();
    let (url, handle) = spawn_policy(r#"{"result": false}"#);
    let path = write_config(&dir, &format!("[policy]\nurl = \"{url}\"\n"));
    let output = run(
        dir.path(),
        &[
            "policy",
            "check",
            "--config",
            &path,
            "--tool-call",
            r#"{"tool":"get_branches","arguments":{"owner":"a","repo":"b"}}"#,
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "deny");
    handle.join().unwrap();
}

#[test]
fn policy_check_reports_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["policy", "check", "--tool-call", "{not json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "error");
    assert!(stderr(&output).contains("decode stage failed"), "stderr: {}", stderr(&output));
}

// ============================================================================
// SECTION: Serve Guards
// ============================================================================

#[test]
fn serve_refuses_non_loopback_without_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[server]
bind = "0.0.0.0:0"

[server.auth]
mode = "bearer_token"
bearer_tokens = ["token"]
"#,
    );
    let output = run(dir.path(), &["serve", "--config", &path]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("POLICY_GATE_ALLOW_NON_LOOPBACK"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn serve_refuses_non_loopback_without_bearer_auth() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[server]\nbind = \"0.0.0.0:0\"\n");
    let output = run(dir.path(), &["serve", "--config", &path, "--allow-non-loopback"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("bearer_token"), "stderr: {}", stderr(&output));
}

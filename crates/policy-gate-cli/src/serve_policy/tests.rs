// crates/policy-gate-cli/src/serve_policy/tests.rs
// ============================================================================
// Module: Serve Policy Tests
// Description: Unit tests for bind exposure checks.
// Purpose: Ensure non-loopback binds fail closed without opt-in and auth.
// Dependencies: policy-gate-config
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test helpers use expect/expect_err for concise failure messages."
)]

use policy_gate_config::PolicyGateConfig;
use policy_gate_config::ServerAuthMode;

use super::ServePolicyError;
use super::enforce_bind_policy;
use super::parse_allow_non_loopback_value;

fn config(contents: &str) -> PolicyGateConfig {
    let config = PolicyGateConfig::from_toml_str(contents).expect("parse config");
    config.validate().expect("valid config");
    config
}

const EXPOSED_WITH_TOKEN: &str = r#"
[server]
bind = "0.0.0.0:8080"

[server.auth]
mode = "bearer_token"
bearer_tokens = ["token"]
"#;

#[test]
fn loopback_bind_needs_no_opt_in() {
    let outcome = enforce_bind_policy(&PolicyGateConfig::default(), false).expect("loopback");
    assert!(!outcome.network_exposed);
    assert!(outcome.bind_addr.ip().is_loopback());
    assert_eq!(outcome.auth_mode, ServerAuthMode::Upstream);
}

#[test]
fn ipv6_loopback_is_not_exposed() {
    let config = config("[server]\nbind = \"[::1]:8000\"\n");
    let outcome = enforce_bind_policy(&config, false).expect("loopback");
    assert!(!outcome.network_exposed);
}

#[test]
fn non_loopback_requires_opt_in() {
    let err = enforce_bind_policy(&config(EXPOSED_WITH_TOKEN), false).expect_err("opt-in");
    assert!(matches!(err, ServePolicyError::NonLoopbackOptInRequired { .. }));
    assert!(err.to_string().contains("POLICY_GATE_ALLOW_NON_LOOPBACK"));
}

#[test]
fn non_loopback_requires_bearer_auth() {
    let config = config("[server]\nbind = \"0.0.0.0:8080\"\n");
    let err = enforce_bind_policy(&config, true).expect_err("auth");
    assert_eq!(
        err,
        ServePolicyError::NonLoopbackAuthRequired {
            bind: "0.0.0.0:8080".to_string(),
        }
    );
}

#[test]
fn non_loopback_allows_bearer_with_opt_in() {
    let outcome = enforce_bind_policy(&config(EXPOSED_WITH_TOKEN), true).expect("allowed");
    assert!(outcome.network_exposed);
    assert_eq!(outcome.auth_mode, ServerAuthMode::BearerToken);
}

#[test]
fn unparsable_bind_is_reported() {
    let mut config = PolicyGateConfig::default();
    config.server.bind = "localhost".to_string();
    let err = enforce_bind_policy(&config, false).expect_err("bind");
    assert!(matches!(err, ServePolicyError::InvalidBind { .. }));
}

#[test]
fn parse_allow_non_loopback_accepts_boolish() {
    assert!(parse_allow_non_loopback_value("true").expect("parse env"));
    assert!(parse_allow_non_loopback_value(" ON ").expect("parse env"));
    assert!(!parse_allow_non_loopback_value("0").expect("parse env"));
}

#[test]
fn parse_allow_non_loopback_rejects_invalid() {
    let err = parse_allow_non_loopback_value("maybe").expect_err("expected invalid env");
    assert!(matches!(err, ServePolicyError::InvalidEnv { .. }));
}

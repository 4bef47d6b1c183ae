// crates/policy-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Unit Tests
// Description: Argument parsing and policy check reporting.
// Purpose: Pin subcommand shapes and the policy check exit statuses.
// Dependencies: clap, policy-gate-core
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use clap::Parser;
use policy_gate_core::DecodeError;
use policy_gate_core::GatewayError;
use policy_gate_core::GatewayOutcome;
use policy_gate_core::PolicyDecision;
use policy_gate_core::ToolCallDescriptor;
use serde_json::Map;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::PolicyCommand;
use super::outcome_detail;
use super::outcome_status;

#[test]
fn parses_serve_flags() {
    let cli = Cli::try_parse_from([
        "policy-gate",
        "serve",
        "--config",
        "gate.toml",
        "--allow-non-loopback",
    ])
    .unwrap();
    let Commands::Serve(command) = cli.command else {
        panic!("expected serve");
    };
    assert!(command.allow_non_loopback);
    assert_eq!(command.config.config.unwrap().to_str(), Some("gate.toml"));
}

#[test]
fn parses_policy_check() {
    let cli = Cli::try_parse_from([
        "policy-gate",
        "policy",
        "check",
        "--tool-call",
        r#"{"tool":"get_repo_info","arguments":{}}"#,
    ])
    .unwrap();
    let Commands::Policy {
        command: PolicyCommand::Check(command),
    } = cli.command
    else {
        panic!("expected policy check");
    };
    assert!(command.tool_call.contains("get_repo_info"));
    assert!(command.config.config.is_none());
}

#[test]
fn policy_check_requires_tool_call() {
    assert!(Cli::try_parse_from(["policy-gate", "policy", "check"]).is_err());
}

#[test]
fn parses_config_subcommands() {
    let cli = Cli::try_parse_from(["policy-gate", "config", "example"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Example
        }
    ));
    let cli = Cli::try_parse_from(["policy-gate", "config", "validate"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Validate(_)
        }
    ));
}

#[test]
fn outcome_statuses_distinguish_deny_from_error() {
    let descriptor = ToolCallDescriptor::new("get_repo_info", Map::new());
    let forward = GatewayOutcome::from_decision(descriptor.clone(), PolicyDecision::allow());
    let deny = GatewayOutcome::from_decision(descriptor, PolicyDecision::deny());
    let error = GatewayOutcome::Error(GatewayError::Decode(DecodeError::Empty));
    assert_eq!(outcome_status(&forward), 0);
    assert_eq!(outcome_status(&deny), 2);
    assert_eq!(outcome_status(&error), 1);
}

#[test]
fn outcome_detail_names_failed_stage() {
    let error = GatewayOutcome::Error(GatewayError::PolicyService(
        "policy service timed out".to_string(),
    ));
    assert_eq!(
        outcome_detail(&error).as_deref(),
        Some("policy_service stage failed: policy service timed out")
    );

    let mut decision = PolicyDecision::deny();
    decision.decision_id = Some("abc".to_string());
    let deny = GatewayOutcome::from_decision(ToolCallDescriptor::new("x", Map::new()), decision);
    assert_eq!(outcome_detail(&deny).as_deref(), Some("decision_id: abc"));

    let forward = GatewayOutcome::from_decision(
        ToolCallDescriptor::new("x", Map::new()),
        PolicyDecision::allow(),
    );
    assert!(outcome_detail(&forward).is_none());
}

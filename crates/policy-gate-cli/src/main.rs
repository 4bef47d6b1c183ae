// crates/policy-gate-cli/src/main.rs
// ============================================================================
// Module: Policy Gate CLI Entry Point
// Description: Command dispatcher for the Policy Gate server and utilities.
// Purpose: Run the gateway and offer offline config and policy checks.
// Dependencies: clap, dotenvy, policy-gate-config, policy-gate-core,
//               policy-gate-mcp, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `policy-gate` binary starts the MCP server behind the policy gateway
//! and exposes a few operator utilities: config validation, a one-shot
//! policy check that runs the same decode and decision path as the gateway,
//! and a dump of the tool definitions. Output goes through explicit stdout
//! and stderr writers; failures exit non-zero.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use policy_gate_cli::serve_policy::BindOutcome;
use policy_gate_cli::serve_policy::enforce_bind_policy;
use policy_gate_cli::serve_policy::resolve_allow_non_loopback;
use policy_gate_config::PolicyGateConfig;
use policy_gate_config::config_toml_example;
use policy_gate_core::GatewayOutcome;
use policy_gate_core::tool_definitions;
use policy_gate_mcp::HttpPolicyClient;
use policy_gate_mcp::NoopAuditSink;
use policy_gate_mcp::PolicyGateServer;
use policy_gate_mcp::PolicyGateway;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "policy-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the policy-gated MCP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Policy service utilities.
    Policy {
        /// Selected policy subcommand.
        #[command(subcommand)]
        command: PolicyCommand,
    },
    /// Tool catalog utilities.
    Tools {
        /// Selected tools subcommand.
        #[command(subcommand)]
        command: ToolsCommand,
    },
}

/// Shared `--config` argument.
#[derive(Args, Debug, Default)]
struct ConfigArg {
    /// Path to `policy-gate.toml` (defaults to `POLICY_GATE_CONFIG` or the
    /// working directory).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Configuration file selection.
    #[command(flatten)]
    config: ConfigArg,
    /// Allow binding a non-loopback address (also `POLICY_GATE_ALLOW_NON_LOOPBACK`).
    #[arg(long, action = clap::ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Policy Gate configuration file.
    Validate(ConfigArg),
    /// Print a commented example configuration.
    Example,
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Evaluate one tool-call descriptor against the policy service.
    Check(PolicyCheckCommand),
}

/// Arguments for `policy check`.
#[derive(Args, Debug)]
struct PolicyCheckCommand {
    /// Tool-call descriptor JSON, as sent in the tool call header.
    #[arg(long, value_name = "JSON")]
    tool_call: String,
    /// Configuration file selection.
    #[command(flatten)]
    config: ConfigArg,
}

/// Tool catalog subcommands.
#[derive(Subcommand, Debug)]
enum ToolsCommand {
    /// Print tool definitions as JSON.
    List,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying the message shown to the operator.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    load_dotenv()?;
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Policy {
            command,
        } => match command {
            PolicyCommand::Check(command) => command_policy_check(command).await,
        },
        Commands::Tools {
            command,
        } => match command {
            ToolsCommand::List => command_tools_list(),
        },
    }
}

/// Loads `.env` from the working directory when one exists.
fn load_dotenv() -> CliResult<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(CliError::new(format!("failed to load .env: {err}"))),
    }
}

/// Loads and validates configuration.
fn load_config(arg: &ConfigArg) -> CliResult<PolicyGateConfig> {
    PolicyGateConfig::load(arg.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let bind = enforce_bind_policy(&config, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    for warning in config.startup_warnings() {
        write_stderr_line(&format!("warning: {warning}")).map_err(output_error)?;
    }
    if bind.network_exposed {
        warn_network_exposure(&bind)?;
    }
    write_stderr_line(&format!(
        "policy-gate listening on {} (policy service: {})",
        bind.bind_addr, config.policy.url
    ))
    .map_err(output_error)?;

    let server = PolicyGateServer::from_config(config)
        .map_err(|err| CliError::new(format!("Failed to initialize server: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("Server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Warns that the server is reachable beyond loopback.
fn warn_network_exposure(bind: &BindOutcome) -> CliResult<()> {
    let audit = if bind.audit_enabled { "on" } else { "off" };
    write_stderr_line(&format!(
        "warning: serving on non-loopback address {} with bearer-token auth (audit {audit})",
        bind.bind_addr
    ))
    .map_err(output_error)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(arg) => {
            let config = load_config(&arg)?;
            for warning in config.startup_warnings() {
                write_stderr_line(&format!("warning: {warning}")).map_err(output_error)?;
            }
            write_stdout_line("Config valid").map_err(output_error)?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end()).map_err(output_error)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Policy Commands
// ============================================================================

/// Executes `policy check`: decodes the descriptor and asks the policy service.
async fn command_policy_check(command: PolicyCheckCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let client = HttpPolicyClient::from_config(&config.policy)
        .map_err(|err| CliError::new(format!("Failed to build policy client: {err}")))?;
    let gateway =
        PolicyGateway::from_config(Arc::new(client), &config.gateway, Arc::new(NoopAuditSink))
            .map_err(|err| CliError::new(err.to_string()))?;
    let outcome = gateway.evaluate_raw(command.tool_call.as_bytes()).await;

    write_stdout_line(outcome.label()).map_err(output_error)?;
    if let Some(detail) = outcome_detail(&outcome) {
        write_stderr_line(&detail).map_err(output_error)?;
    }
    Ok(ExitCode::from(outcome_status(&outcome)))
}

/// Exit status for a policy check: 0 forward, 2 deny, 1 error.
const fn outcome_status(outcome: &GatewayOutcome) -> u8 {
    match outcome {
        GatewayOutcome::Forward {
            ..
        } => 0,
        GatewayOutcome::Deny {
            ..
        } => 2,
        GatewayOutcome::Error(_) => 1,
    }
}

/// Operator-facing detail line for a policy check outcome.
fn outcome_detail(outcome: &GatewayOutcome) -> Option<String> {
    if let GatewayOutcome::Error(err) = outcome {
        return Some(format!("{} stage failed: {err}", err.stage().as_str()));
    }
    outcome
        .decision()
        .and_then(|decision| decision.decision_id.as_deref())
        .map(|id| format!("decision_id: {id}"))
}

// ============================================================================
// SECTION: Tools Commands
// ============================================================================

/// Prints tool definitions as pretty JSON.
fn command_tools_list() -> CliResult<ExitCode> {
    let rendered = serde_json::to_string_pretty(&tool_definitions())
        .map_err(|err| CliError::new(format!("Failed to render tools: {err}")))?;
    write_stdout_line(&rendered).map_err(output_error)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Wraps an output failure.
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err adapter.")]
fn output_error(error: std::io::Error) -> CliError {
    CliError::new(format!("Failed to write output: {error}"))
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

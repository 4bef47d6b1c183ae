// crates/policy-gate-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure checks for the CLI server launcher.
// Purpose: Keep the gateway on loopback unless exposure is explicitly allowed.
// Dependencies: policy-gate-config, thiserror
// ============================================================================

//! ## Overview
//! Decides whether `policy-gate serve` may bind its configured address. The
//! policy is fail-closed: a non-loopback bind needs an explicit opt-in (flag
//! or environment) and static bearer-token auth on the inbound side.

use std::env;
use std::net::SocketAddr;

use policy_gate_config::PolicyGateConfig;
use policy_gate_config::ServerAuthMode;
use thiserror::Error;

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "POLICY_GATE_ALLOW_NON_LOOPBACK";

/// Resolved bind decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOutcome {
    /// Socket address the server will bind.
    pub bind_addr: SocketAddr,
    /// True when the address is reachable beyond loopback.
    pub network_exposed: bool,
    /// Effective inbound auth mode.
    pub auth_mode: ServerAuthMode,
    /// Whether audit logging is enabled.
    pub audit_enabled: bool,
}

/// Bind policy violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServePolicyError {
    /// Environment variable held something other than a boolean.
    #[error("POLICY_GATE_ALLOW_NON_LOOPBACK must be a boolean, got '{value}'")]
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    #[error("invalid bind address {bind}: {error}")]
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    #[error(
        "refusing to bind non-loopback address {bind}; pass --allow-non-loopback or set \
         POLICY_GATE_ALLOW_NON_LOOPBACK=1"
    )]
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
    /// Non-loopback binding requires bearer-token auth.
    #[error("non-loopback bind {bind} requires server.auth.mode = bearer_token")]
    NonLoopbackAuthRequired {
        /// Bind address.
        bind: String,
    },
}

/// Resolves the non-loopback opt-in from the CLI flag and the environment.
///
/// # Errors
///
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is invalid.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    parse_allow_non_loopback_value(&value.to_string_lossy())
}

/// Checks the configured bind against the exposure policy.
///
/// # Errors
///
/// Returns [`ServePolicyError`] when the bind is invalid or exposure is not
/// permitted.
pub fn enforce_bind_policy(
    config: &PolicyGateConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let bind = config.server.bind.trim();
    let bind_addr: SocketAddr =
        bind.parse().map_err(|err: std::net::AddrParseError| ServePolicyError::InvalidBind {
            bind: bind.to_string(),
            error: err.to_string(),
        })?;
    let auth_mode = config.server.auth.mode;
    let network_exposed = !bind_addr.ip().is_loopback();
    if network_exposed {
        if !allow_non_loopback {
            return Err(ServePolicyError::NonLoopbackOptInRequired {
                bind: bind.to_string(),
            });
        }
        if auth_mode != ServerAuthMode::BearerToken {
            return Err(ServePolicyError::NonLoopbackAuthRequired {
                bind: bind.to_string(),
            });
        }
    }
    Ok(BindOutcome {
        bind_addr,
        network_exposed,
        auth_mode,
        audit_enabled: config.server.audit.enabled,
    })
}

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an environment value for the non-loopback opt-in.
fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).ok_or_else(|| ServePolicyError::InvalidEnv {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests;

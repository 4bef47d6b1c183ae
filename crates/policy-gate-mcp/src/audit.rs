// crates/policy-gate-mcp/src/audit.rs
// ============================================================================
// Module: Policy Gate Audit Logging
// Description: Structured audit events for gateway, auth, and MCP requests.
// Purpose: Emit redacted JSON-line audit logs without hard dependencies.
// Dependencies: policy-gate-core, serde
// ============================================================================

//! ## Overview
//! Audit events are plain serializable structs written as one JSON object per
//! line. Sinks are deliberately small so deployments can route the stream to
//! whatever pipeline they already run. Tool arguments never appear in any
//! event; only the tool name and the policy decision identifier are kept.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use policy_gate_core::GatewayOutcome;
use serde::Serialize;

use crate::auth::AuthAuditEvent;

// ============================================================================
// SECTION: Gateway Events
// ============================================================================

/// Audit event emitted once per gated request.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier from `x-request-id` when provided.
    pub request_id: Option<String>,
    /// Request path.
    pub path: String,
    /// Gateway outcome label (`forward`, `deny`, `error`).
    pub outcome: &'static str,
    /// Failing stage for error outcomes.
    pub stage: Option<&'static str>,
    /// Tool named by the descriptor when decoding succeeded.
    pub tool: Option<String>,
    /// Policy decision identifier when reported.
    pub decision_id: Option<String>,
    /// Failure reason for error outcomes.
    pub reason: Option<String>,
    /// HTTP status returned for rejected requests.
    pub status: Option<u16>,
    /// Time spent in the gateway in milliseconds.
    pub latency_ms: u128,
}

impl GatewayAuditEvent {
    /// Builds an event from a gateway outcome.
    #[must_use]
    pub fn from_outcome(
        outcome: &GatewayOutcome,
        request_id: Option<String>,
        path: &str,
        status: Option<u16>,
        latency_ms: u128,
    ) -> Self {
        let (stage, reason) = match outcome {
            GatewayOutcome::Error(err) => (Some(err.stage().as_str()), Some(err.to_string())),
            _ => (None, None),
        };
        Self {
            event: "policy_gateway",
            timestamp_ms: now_ms(),
            request_id,
            path: path.to_string(),
            outcome: outcome.label(),
            stage,
            tool: outcome.descriptor().map(|descriptor| descriptor.tool.clone()),
            decision_id: outcome.decision().and_then(|decision| decision.decision_id.clone()),
            reason,
            status,
            latency_ms,
        }
    }
}

// ============================================================================
// SECTION: MCP Events
// ============================================================================

/// Audit event emitted once per JSON-RPC request on the MCP endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier from `x-request-id` when provided.
    pub request_id: Option<String>,
    /// JSON-RPC method.
    pub method: String,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Request outcome (`ok`, `tool_error`, `error`).
    pub outcome: &'static str,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Whether the call passed through the policy gateway.
    pub gated: bool,
    /// Time spent handling the request in milliseconds.
    pub latency_ms: u128,
}

/// Inputs required to construct an MCP audit event.
pub struct McpAuditEventParams {
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// JSON-RPC method.
    pub method: String,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Request outcome label.
    pub outcome: &'static str,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Whether the call passed through the policy gateway.
    pub gated: bool,
    /// Handling latency in milliseconds.
    pub latency_ms: u128,
}

impl McpAuditEvent {
    /// Builds an MCP request event.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        Self {
            event: "mcp_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            method: params.method,
            tool: params.tool,
            outcome: params.outcome,
            error_code: params.error_code,
            gated: params.gated,
            latency_ms: params.latency_ms,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for gateway, auth, and MCP request events.
pub trait AuditSink: Send + Sync {
    /// Records a gateway decision.
    fn record_gateway(&self, event: &GatewayAuditEvent);

    /// Records an inbound auth decision.
    fn record_auth(&self, _event: &AuthAuditEvent) {}

    /// Records a completed MCP request.
    fn record_request(&self, _event: &McpAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StderrAuditSink {
    /// Writes one serialized event line to stderr.
    fn emit(payload: &impl Serialize) {
        if let Ok(line) = serde_json::to_string(payload) {
            let _ = writeln!(io::stderr(), "{line}");
        }
    }
}

impl AuditSink for StderrAuditSink {
    fn record_gateway(&self, event: &GatewayAuditEvent) {
        Self::emit(event);
    }

    fn record_auth(&self, event: &AuthAuditEvent) {
        Self::emit(event);
    }

    fn record_request(&self, event: &McpAuditEvent) {
        Self::emit(event);
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Append-mode log file.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit log for appending.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event line.
    fn emit(&self, payload: &impl Serialize) {
        if let Ok(line) = serde_json::to_string(payload)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_gateway(&self, event: &GatewayAuditEvent) {
        self.emit(event);
    }

    fn record_auth(&self, event: &AuthAuditEvent) {
        self.emit(event);
    }

    fn record_request(&self, event: &McpAuditEvent) {
        self.emit(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_gateway(&self, _event: &GatewayAuditEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

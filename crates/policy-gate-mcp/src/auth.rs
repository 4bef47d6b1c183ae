// crates/policy-gate-mcp/src/auth.rs
// ============================================================================
// Module: Policy Gate Inbound Auth
// Description: Caller authentication for the MCP endpoint.
// Purpose: Provide strict, fail-closed inbound auth ahead of tool dispatch.
// Dependencies: policy-gate-config, serde, sha2, subtle
// ============================================================================

//! ## Overview
//! Two modes are supported. In `upstream` mode a fronting proxy or identity
//! layer has already authenticated the caller and every request is accepted.
//! In `bearer_token` mode the `Authorization` header must carry one of the
//! configured tokens; comparison runs in constant time and only a SHA-256
//! fingerprint of the token is ever logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::net::IpAddr;

use policy_gate_config::ServerAuthConfig;
use policy_gate_config::ServerAuthMode;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted `Authorization` header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for auth decisions.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value.
    pub auth_header: Option<String>,
    /// Request identifier for auditing.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds an HTTP request context.
    #[must_use]
    pub const fn http(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self {
            peer_ip,
            auth_header,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Authenticated caller context.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authentication method.
    pub method: AuthMethod,
    /// Token fingerprint for bearer auth (sha256, hex).
    pub token_fingerprint: Option<String>,
}

/// Authentication method used for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Authenticated by an upstream proxy.
    Upstream,
    /// Static bearer token.
    BearerToken,
}

impl AuthMethod {
    /// Returns the method label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::BearerToken => "bearer_token",
        }
    }
}

/// Action being authorized.
#[derive(Debug, Clone, Copy)]
pub enum AuthAction<'a> {
    /// List tools.
    ListTools,
    /// Call the named tool.
    CallTool(&'a str),
    /// Any request carrying the tool-call header, checked before the policy
    /// service is consulted.
    GatedRequest,
}

impl<'a> AuthAction<'a> {
    /// MCP method or tool name recorded in audit events.
    const fn label(self) -> &'a str {
        match self {
            Self::ListTools => "tools/list",
            Self::CallTool(tool) => tool,
            Self::GatedRequest => "tools/call",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Inbound authentication interface.
pub trait ToolAuthz: Send + Sync {
    /// Authenticates a request. Returns the caller context on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the caller is not authenticated.
    fn authorize(
        &self,
        ctx: &RequestContext,
        action: AuthAction<'_>,
    ) -> Result<AuthContext, AuthError>;
}

// ============================================================================
// SECTION: Default Policy
// ============================================================================

/// Default auth implementation derived from server config.
pub struct DefaultToolAuthz {
    /// Configured auth mode.
    mode: ServerAuthMode,
    /// Accepted bearer tokens.
    bearer_tokens: Vec<String>,
}

impl DefaultToolAuthz {
    /// Builds the auth policy from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        Self {
            mode: config.mode,
            bearer_tokens: config.bearer_tokens.clone(),
        }
    }
}

impl ToolAuthz for DefaultToolAuthz {
    fn authorize(
        &self,
        ctx: &RequestContext,
        _action: AuthAction<'_>,
    ) -> Result<AuthContext, AuthError> {
        match self.mode {
            ServerAuthMode::Upstream => Ok(AuthContext {
                method: AuthMethod::Upstream,
                token_fingerprint: None,
            }),
            ServerAuthMode::BearerToken => authorize_bearer(ctx, &self.bearer_tokens),
        }
    }
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Auth audit event payload.
#[derive(Debug, Serialize)]
pub struct AuthAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// MCP action name.
    action: String,
    /// Caller IP address (if available).
    peer_ip: Option<String>,
    /// Auth method label.
    auth_method: Option<&'static str>,
    /// Bearer token fingerprint (sha256).
    token_fingerprint: Option<String>,
    /// Failure reason (for deny events).
    reason: Option<String>,
    /// Request identifier (if provided).
    request_id: Option<String>,
}

impl AuthAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(ctx: &RequestContext, action: AuthAction<'_>, auth: &AuthContext) -> Self {
        Self {
            event: "mcp_authn",
            decision: "allow",
            action: action.label().to_string(),
            peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
            auth_method: Some(auth.method.as_str()),
            token_fingerprint: auth.token_fingerprint.clone(),
            reason: None,
            request_id: ctx.request_id.clone(),
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(ctx: &RequestContext, action: AuthAction<'_>, error: &AuthError) -> Self {
        Self {
            event: "mcp_authn",
            decision: "deny",
            action: action.label().to_string(),
            peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
            auth_method: None,
            token_fingerprint: None,
            reason: Some(error.to_string()),
            request_id: ctx.request_id.clone(),
        }
    }

    /// Returns the decision label.
    #[must_use]
    pub const fn decision(&self) -> &'static str {
        self.decision
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks the bearer token against the configured set. Both sides are hashed
/// first so the comparison is constant time over fixed-length digests.
fn authorize_bearer(ctx: &RequestContext, tokens: &[String]) -> Result<AuthContext, AuthError> {
    let token = parse_bearer_token(ctx.auth_header.as_deref())?;
    if !token_matches(&token, tokens) {
        return Err(AuthError::Unauthenticated("invalid bearer token".to_string()));
    }
    Ok(AuthContext {
        method: AuthMethod::BearerToken,
        token_fingerprint: Some(fingerprint(&token)),
    })
}

/// Returns whether `token` equals any configured token, visiting every entry.
pub(crate) fn token_matches(token: &str, tokens: &[String]) -> bool {
    let presented = Sha256::digest(token.as_bytes());
    let mut matched = subtle::Choice::from(0);
    for candidate in tokens {
        matched |= Sha256::digest(candidate.as_bytes()).as_slice().ct_eq(presented.as_slice());
    }
    bool::from(matched)
}

/// Extracts the token from a `Bearer` authorization header.
pub(crate) fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let unauthenticated = |reason: &str| AuthError::Unauthenticated(reason.to_string());
    let header = auth_header.ok_or_else(|| unauthenticated("missing authorization"))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(unauthenticated("oversized authorization header"));
    }
    let (scheme, token) = header.trim().split_once(' ').unwrap_or_default();
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(unauthenticated("expected a bearer token"));
    }
    Ok(token.to_string())
}

/// Returns the hex-encoded SHA-256 digest of a token.
pub(crate) fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

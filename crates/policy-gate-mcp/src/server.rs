// crates/policy-gate-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: HTTP server exposing GitHub tools through JSON-RPC 2.0.
// Purpose: Compose the policy gateway, tool router, and discovery endpoint.
// Dependencies: policy-gate-config, policy-gate-github, axum, tower-http, tokio
// ============================================================================

//! ## Overview
//! The server exposes three routes:
//!
//! - `GET /.well-known/oauth-protected-resource`: protected-resource metadata.
//! - `GET /health`: liveness probe.
//! - `POST /mcp`: JSON-RPC 2.0 (`initialize`, `ping`, `tools/list`,
//!   `tools/call`).
//!
//! Every route sits behind [`enforce_policy`]; only requests carrying the
//! tool-call header are gated, so discovery and health traffic is never
//! blocked by the policy service. Gated requests are authenticated first:
//! an unauthenticated caller gets a 401 without any policy call, so the
//! gateway cannot be used to learn verdicts. The policy client and GitHub client are
//! built once in [`PolicyGateServer::from_config`] and shared by all
//! requests.
//!
//! Security posture: request bodies are size-limited and parsed strictly;
//! see `crate::gateway` for the policy boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::HOST;
use axum::http::header::WWW_AUTHENTICATE;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use policy_gate_config::CorsConfig;
use policy_gate_config::IdentityConfig;
use policy_gate_config::PolicyGateConfig;
use policy_gate_config::ServerAuditConfig;
use policy_gate_core::ToolCallDescriptor;
use policy_gate_core::ToolDefinition;
use policy_gate_github::GitHubClient;
use policy_gate_github::GitHubTools;
use policy_gate_github::ToolDispatcher;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::AuthAction;
use crate::auth::AuthAuditEvent;
use crate::auth::DefaultToolAuthz;
use crate::auth::RequestContext;
use crate::auth::ToolAuthz;
use crate::gateway::GatedToolCall;
use crate::gateway::PolicyGateway;
use crate::gateway::enforce_policy;
use crate::gateway::request_id;
use crate::policy::HttpPolicyClient;
use crate::policy::PolicyClient;
use crate::tools::RouterError;
use crate::tools::ToolRouter;
use crate::tools::ToolRouterConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Protected-resource metadata path.
pub const RESOURCE_METADATA_PATH: &str = "/.well-known/oauth-protected-resource";

/// JSON-RPC endpoint path.
pub const MCP_PATH: &str = "/mcp";

/// Health probe path.
pub const HEALTH_PATH: &str = "/health";

/// MCP protocol revision reported by `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Server name reported by `initialize`.
const SERVER_NAME: &str = "policy-gate";

// ============================================================================
// SECTION: Server
// ============================================================================

/// Policy-gated MCP server.
pub struct PolicyGateServer {
    /// Validated configuration.
    config: PolicyGateConfig,
    /// Policy gateway shared by the middleware.
    gateway: Arc<PolicyGateway>,
    /// Handler state shared by the routes.
    state: Arc<ServerState>,
}

/// Collaborators injected into the server.
pub struct ServerComponents {
    /// Policy decision client.
    pub policy: Arc<dyn PolicyClient>,
    /// Tool dispatch layer.
    pub dispatcher: Arc<dyn ToolDispatcher>,
    /// Audit sink for gateway, auth, and request events.
    pub audit: Arc<dyn AuditSink>,
}

impl PolicyGateServer {
    /// Builds the server and its long-lived HTTP clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration is invalid or a client
    /// or audit sink cannot be initialized.
    pub fn from_config(config: PolicyGateConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        let policy = HttpPolicyClient::from_config(&config.policy)
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        let github = GitHubClient::from_config(&config.github)
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        Self::with_components(
            config,
            ServerComponents {
                policy: Arc::new(policy),
                dispatcher: Arc::new(GitHubTools::new(github)),
                audit,
            },
        )
    }

    /// Builds the server around caller-supplied collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Config`] when configuration is invalid.
    pub fn with_components(
        config: PolicyGateConfig,
        components: ServerComponents,
    ) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let gateway = PolicyGateway::from_config(
            components.policy,
            &config.gateway,
            Arc::clone(&components.audit),
        )
        .map_err(|err| McpServerError::Config(err.to_string()))?;
        let authz: Arc<dyn ToolAuthz> =
            Arc::new(DefaultToolAuthz::from_config(&config.server.auth));
        let router = ToolRouter::new(ToolRouterConfig {
            dispatcher: components.dispatcher,
            authz: Arc::clone(&authz),
            audit: Arc::clone(&components.audit),
            require_gated_tool_calls: config.gateway.require_gated_tool_calls,
        });
        let state = Arc::new(ServerState {
            router,
            authz,
            tool_call_header: gateway.header_name().clone(),
            audit: components.audit,
            identity: config.identity.clone(),
            public_base_url: config.server.public_base_url.clone(),
            max_body_bytes: config.server.max_body_bytes,
        });
        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            state,
        })
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &PolicyGateConfig {
        &self.config
    }

    /// Builds the axum application.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Config`] when a CORS origin is invalid.
    pub fn app(&self) -> Result<Router, McpServerError> {
        let app = Router::new()
            .route(RESOURCE_METADATA_PATH, get(handle_resource_metadata))
            .route(HEALTH_PATH, get(handle_health))
            .route(MCP_PATH, post(handle_mcp))
            .with_state(Arc::clone(&self.state))
            .layer(middleware::from_fn_with_state(Arc::clone(&self.gateway), enforce_policy))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.state),
                authenticate_gated_requests,
            ));
        Ok(match cors_layer(&self.config.server.cors)? {
            Some(cors) => app.layer(cors),
            None => app,
        })
    }

    /// Binds the configured address and serves until the server fails.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| McpServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| McpServerError::Transport("http bind failed".to_string()))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), McpServerError> {
        let app = self.app()?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| McpServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the configured audit sink.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn AuditSink>, McpServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| McpServerError::Init(format!("audit log: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Builds the CORS layer; `None` when no origins are configured.
fn cors_layer(config: &CorsConfig) -> Result<Option<CorsLayer>, McpServerError> {
    if config.allowed_origins.is_empty() {
        return Ok(None);
    }
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return Ok(Some(layer.allow_origin(Any)));
    }
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| McpServerError::Config(format!("invalid cors origin: {origin}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(layer.allow_origin(origins)))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared state for route handlers.
struct ServerState {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Inbound auth checked ahead of the policy gateway.
    authz: Arc<dyn ToolAuthz>,
    /// Header that marks a request as subject to policy.
    tool_call_header: HeaderName,
    /// Audit sink for MCP request events.
    audit: Arc<dyn AuditSink>,
    /// Identity metadata advertised by the discovery endpoint.
    identity: IdentityConfig,
    /// Configured public base URL.
    public_base_url: Option<String>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Protected-resource metadata document.
#[derive(Debug, Serialize)]
struct ResourceMetadata {
    /// Resource identifier.
    resource: String,
    /// Authorization server issuers.
    authorization_servers: Vec<String>,
    /// Supported scopes.
    scopes_supported: Vec<String>,
    /// Supported bearer token transmission methods.
    bearer_methods_supported: Vec<String>,
}

/// Serves the protected-resource metadata document.
async fn handle_resource_metadata(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Json<ResourceMetadata> {
    Json(ResourceMetadata {
        resource: resource_url(&state, &headers),
        authorization_servers: state.identity.issuer.iter().cloned().collect(),
        scopes_supported: state.identity.scopes_supported.clone(),
        bearer_methods_supported: state.identity.bearer_methods_supported.clone(),
    })
}

/// Liveness probe.
async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Handles JSON-RPC requests on the MCP endpoint.
async fn handle_mcp(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
    let gated = parts.extensions.get::<GatedToolCall>().map(|call| call.0.clone());
    let context = http_request_context(peer, &parts.headers);
    let Ok(bytes) = axum::body::to_bytes(body, state.max_body_bytes).await else {
        return rpc_error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            Value::Null,
            -32070,
            "request body too large",
        );
    };
    let Ok(request) = serde_json::from_slice::<JsonRpcRequest>(&bytes) else {
        return rpc_error_response(
            StatusCode::BAD_REQUEST,
            Value::Null,
            -32600,
            "invalid json-rpc request",
        );
    };
    let Some(id) = request.id.clone() else {
        return StatusCode::ACCEPTED.into_response();
    };
    let method = request.method.clone();
    let tool = (method == "tools/call")
        .then(|| request.params.as_ref()?.get("name")?.as_str().map(str::to_string))
        .flatten();
    let (status, payload) = handle_request(&state, &context, gated.as_ref(), id, request).await;
    state.audit.record_request(&McpAuditEvent::new(McpAuditEventParams {
        request_id: context.request_id.clone(),
        method,
        tool,
        outcome: payload.outcome(),
        error_code: payload.error.as_ref().map(|error| error.code),
        gated: gated.is_some(),
        latency_ms: started.elapsed().as_millis(),
    }));
    let mut response = (status, Json(payload)).into_response();
    if status == StatusCode::UNAUTHORIZED {
        add_auth_challenge(&state, &parts.headers, &mut response);
    }
    response
}

/// Rejects unauthenticated requests that carry the tool-call header before
/// [`enforce_policy`] asks the policy service about them.
async fn authenticate_gated_requests(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    if !request.headers().contains_key(&state.tool_call_header) {
        return next.run(request).await;
    }
    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
    let context = http_request_context(peer, request.headers());
    let action = AuthAction::GatedRequest;
    let Err(err) = state.authz.authorize(&context, action) else {
        return next.run(request).await;
    };
    state.audit.record_auth(&AuthAuditEvent::denied(&context, action, &err));
    let mut response =
        rpc_error_response(StatusCode::UNAUTHORIZED, Value::Null, -32001, "unauthenticated");
    add_auth_challenge(&state, request.headers(), &mut response);
    response
}

/// Adds the bearer challenge pointing at the protected-resource metadata.
fn add_auth_challenge(state: &ServerState, headers: &HeaderMap, response: &mut Response) {
    if let Ok(challenge) = HeaderValue::from_str(&format!(
        "Bearer resource_metadata=\"{}{RESOURCE_METADATA_PATH}\"",
        resource_url(state, headers)
    )) {
        response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
    }
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Returns the audit outcome label.
    fn outcome(&self) -> &'static str {
        if self.error.is_some() {
            "error"
        } else if self
            .result
            .as_ref()
            .and_then(|result| result.get("isError"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            "tool_error"
        } else {
            "ok"
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Dispatches a JSON-RPC request.
async fn handle_request(
    state: &ServerState,
    context: &RequestContext,
    gated: Option<&ToolCallDescriptor>,
    id: Value,
    request: JsonRpcRequest,
) -> (StatusCode, JsonRpcResponse) {
    if request.jsonrpc != "2.0" {
        return (
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::failure(id, -32600, "invalid json-rpc version"),
        );
    }
    match request.method.as_str() {
        "initialize" => (StatusCode::OK, JsonRpcResponse::success(id, initialize_result())),
        "ping" => (StatusCode::OK, JsonRpcResponse::success(id, json!({}))),
        "tools/list" => match state.router.list_tools(context) {
            Ok(tools) => to_response(id, &ToolListResult {
                tools,
            }),
            Err(err) => jsonrpc_error(id, err),
        },
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
                return (
                    StatusCode::BAD_REQUEST,
                    JsonRpcResponse::failure(id, -32602, "invalid tool params"),
                );
            };
            match state.router.handle_tool_call(context, gated, &call.name, call.arguments).await
            {
                Ok(result) => to_response(id, &result),
                Err(err) => jsonrpc_error(id, err),
            }
        }
        _ => (StatusCode::BAD_REQUEST, JsonRpcResponse::failure(id, -32601, "method not found")),
    }
}

/// Returns the `initialize` result.
fn initialize_result() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {"tools": {"listChanged": false}},
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
    })
}

/// Serializes a result payload into a success response.
fn to_response(id: Value, payload: &impl Serialize) -> (StatusCode, JsonRpcResponse) {
    match serde_json::to_value(payload) {
        Ok(value) => (StatusCode::OK, JsonRpcResponse::success(id, value)),
        Err(err) => jsonrpc_error(id, RouterError::Serialization(err.to_string())),
    }
}

/// Builds a JSON-RPC error response for a routing failure.
fn jsonrpc_error(id: Value, error: RouterError) -> (StatusCode, JsonRpcResponse) {
    let (status, code, message) = match error {
        RouterError::Unauthenticated(_) => {
            (StatusCode::UNAUTHORIZED, -32001, "unauthenticated".to_string())
        }
        RouterError::Unauthorized(message) => (StatusCode::FORBIDDEN, -32003, message),
        err @ RouterError::UnknownTool(_) => (StatusCode::BAD_REQUEST, -32601, err.to_string()),
        RouterError::InvalidParams(message) => (StatusCode::BAD_REQUEST, -32602, message),
        RouterError::Serialization(_) => {
            (StatusCode::OK, -32060, "serialization failed".to_string())
        }
    };
    (status, JsonRpcResponse::failure(id, code, message))
}

/// Builds a bare JSON-RPC error response.
fn rpc_error_response(status: StatusCode, id: Value, code: i64, message: &str) -> Response {
    (status, Json(JsonRpcResponse::failure(id, code, message))).into_response()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the request context from HTTP metadata.
fn http_request_context(peer: Option<IpAddr>, headers: &HeaderMap) -> RequestContext {
    let auth_header =
        headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
    RequestContext::http(peer, auth_header).with_request_id(request_id(headers))
}

/// Returns the advertised resource URL.
fn resource_url(state: &ServerState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| is_valid_host(host))
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// Returns true for `host[:port]` values safe to echo into a URL.
fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 255
        && host.bytes().all(|byte| {
            byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b':' | b'[' | b']')
        })
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests;

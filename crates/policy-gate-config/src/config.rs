// crates/policy-gate-config/src/config.rs
// ============================================================================
// Module: Policy Gate Configuration
// Description: Configuration loading, environment overrides, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is read once at startup from an optional TOML file, then
//! overlaid with environment variables for credentials and endpoints.
//! Invalid configuration fails closed. Missing-but-optional values (the
//! GitHub token, the identity issuer) are reported through
//! [`PolicyGateConfig::startup_warnings`] so they surface at startup rather
//! than on the first request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Host;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "policy-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "POLICY_GATE_CONFIG";
/// Environment variable carrying the upstream API token.
pub const GITHUB_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";
/// Environment variable overriding the upstream API base URL.
pub const GITHUB_API_BASE_ENV_VAR: &str = "GITHUB_API_BASE";
/// Environment variable overriding the policy-service URL.
pub const POLICY_URL_ENV_VAR: &str = "POLICY_GATE_POLICY_URL";
/// Environment variable overriding the identity issuer URL.
pub const AUTH_ISSUER_ENV_VAR: &str = "POLICY_GATE_AUTH_ISSUER";
/// Environment variable overriding the bind address.
pub const BIND_ENV_VAR: &str = "POLICY_GATE_BIND";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of server auth tokens.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a server auth token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Maximum accepted request body size.
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum accepted tool-call header size.
pub(crate) const MAX_HEADER_BYTES: usize = 64 * 1024;
/// Maximum length of the tool-call header name.
pub(crate) const MAX_HEADER_NAME_LENGTH: usize = 64;
/// Maximum accepted upstream or policy response size.
pub(crate) const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Minimum connect timeout in milliseconds.
pub(crate) const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 30_000;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Maximum number of CORS origins.
pub(crate) const MAX_CORS_ORIGINS: usize = 64;
/// Headers that cannot carry the tool-call descriptor.
const RESERVED_HEADERS: &[&str] =
    &["authorization", "content-length", "content-type", "host", "transfer-encoding"];
/// Bearer token transmission methods that may be advertised.
const KNOWN_BEARER_METHODS: &[&str] = &["header", "body", "query"];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Policy Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyGateConfig {
    /// Inbound server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Policy gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// External policy-service configuration.
    #[serde(default)]
    pub policy: PolicyServiceConfig,
    /// Upstream GitHub API configuration.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Identity metadata advertised by the discovery endpoint.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Path the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl PolicyGateConfig {
    /// Loads configuration using the default resolution rules and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => {
                let mut config = Self::from_file(&resolved)?;
                config.source = Some(resolved);
                config
            }
            None => Self::default(),
        };
        config.apply_env_with(&lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML file without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration from TOML text without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Overlays environment variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(&|key: &str| env::var(key).ok());
    }

    /// Overlays environment variables using the provided lookup. Empty values
    /// are ignored.
    pub fn apply_env_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let read = |key: &str| {
            lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        };
        if let Some(token) = read(GITHUB_TOKEN_ENV_VAR) {
            self.github.token = Some(token);
        }
        if let Some(api_base) = read(GITHUB_API_BASE_ENV_VAR) {
            self.github.api_base = api_base;
        }
        if let Some(url) = read(POLICY_URL_ENV_VAR) {
            self.policy.url = url;
        }
        if let Some(issuer) = read(AUTH_ISSUER_ENV_VAR) {
            self.identity.issuer = Some(issuer);
        }
        if let Some(bind) = read(BIND_ENV_VAR) {
            self.server.bind = bind;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.gateway.validate()?;
        self.policy.validate()?;
        self.github.validate()?;
        self.identity.validate()?;
        Ok(())
    }

    /// Returns warnings for missing optional settings and risky combinations.
    #[must_use]
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.github.token.is_none() {
            warnings.push(format!(
                "github.token is not set ({GITHUB_TOKEN_ENV_VAR}); upstream calls are \
                 unauthenticated and rate limited"
            ));
        }
        if self.identity.issuer.is_none() {
            warnings.push(format!(
                "identity.issuer is not set ({AUTH_ISSUER_ENV_VAR}); discovery metadata \
                 advertises no authorization servers"
            ));
        }
        if self.server.auth.mode == ServerAuthMode::Upstream && !self.server.is_loopback_bind() {
            warnings.push(format!(
                "server.auth.mode = upstream on non-loopback bind {}; callers must be \
                 authenticated by a fronting proxy",
                self.server.bind
            ));
        }
        if is_plain_http_remote(&self.policy.url) {
            warnings.push("policy.url uses plain http to a non-loopback host".to_string());
        }
        if !self.gateway.require_gated_tool_calls {
            warnings.push(
                "gateway.require_gated_tool_calls = false; tool calls without the tool call \
                 header bypass policy evaluation"
                    .to_string(),
            );
        }
        warnings
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Inbound HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Public base URL advertised as the protected resource. When unset, the
    /// request `Host` header is used.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Inbound authentication configuration.
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
    /// Cross-origin configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            public_base_url: None,
            auth: ServerAuthConfig::default(),
            audit: ServerAuditConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is invalid: {}", self.bind)))
    }

    /// Returns true when the bind address is a loopback address.
    #[must_use]
    pub fn is_loopback_bind(&self) -> bool {
        self.bind_addr().is_ok_and(|addr| addr.ip().is_loopback())
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        validate_limit("server.max_body_bytes", self.max_body_bytes, MAX_BODY_BYTES)?;
        if let Some(base) = &self.public_base_url {
            validate_http_url("server.public_base_url", base)?;
        }
        self.auth.validate()?;
        self.audit.validate()?;
        self.cors.validate()
    }
}

/// Inbound authentication modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Callers are authenticated by a fronting proxy or identity layer.
    #[default]
    Upstream,
    /// Callers present one of the configured static bearer tokens.
    BearerToken,
}

/// Inbound authentication configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuthConfig {
    /// Authentication mode.
    #[serde(default)]
    pub mode: ServerAuthMode,
    /// Accepted bearer tokens (bearer-token mode only).
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
}

impl fmt::Debug for ServerAuthConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerAuthConfig")
            .field("mode", &self.mode)
            .field("bearer_tokens", &format_args!("[{} redacted]", self.bearer_tokens.len()))
            .finish()
    }
}

impl ServerAuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            ServerAuthMode::Upstream => {
                if !self.bearer_tokens.is_empty() {
                    return Err(ConfigError::Invalid(
                        "server.auth.bearer_tokens requires mode = bearer_token".to_string(),
                    ));
                }
            }
            ServerAuthMode::BearerToken => {
                if self.bearer_tokens.is_empty() {
                    return Err(ConfigError::Invalid(
                        "server.auth.mode = bearer_token requires bearer_tokens".to_string(),
                    ));
                }
                if self.bearer_tokens.len() > MAX_AUTH_TOKENS {
                    return Err(ConfigError::Invalid(
                        "server.auth.bearer_tokens exceeds max entries".to_string(),
                    ));
                }
                for token in &self.bearer_tokens {
                    validate_secret("server.auth.bearer_tokens", token, MAX_AUTH_TOKEN_LENGTH)?;
                }
            }
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines). Stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

/// Cross-origin resource sharing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any origin. Empty disables CORS.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Returns true when any origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    /// Validates CORS configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.len() > MAX_CORS_ORIGINS {
            return Err(ConfigError::Invalid(
                "server.cors.allowed_origins exceeds max entries".to_string(),
            ));
        }
        if self.allows_any_origin() && self.allowed_origins.len() > 1 {
            return Err(ConfigError::Invalid(
                "server.cors.allowed_origins cannot mix \"*\" with explicit origins".to_string(),
            ));
        }
        for origin in self.allowed_origins.iter().filter(|origin| *origin != "*") {
            validate_http_url("server.cors.allowed_origins", origin)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Policy gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Header carrying the tool-call descriptor.
    #[serde(default = "default_tool_call_header")]
    pub tool_call_header: String,
    /// Maximum encoded descriptor size in bytes.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,
    /// Reject `tools/call` requests that did not pass through the gateway.
    #[serde(default = "default_require_gated_tool_calls")]
    pub require_gated_tool_calls: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            tool_call_header: default_tool_call_header(),
            max_header_bytes: default_max_header_bytes(),
            require_gated_tool_calls: default_require_gated_tool_calls(),
        }
    }
}

impl GatewayConfig {
    /// Validates gateway configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.tool_call_header.as_str();
        if name.is_empty() || name.len() > MAX_HEADER_NAME_LENGTH {
            return Err(ConfigError::Invalid(
                "gateway.tool_call_header must be 1-64 characters".to_string(),
            ));
        }
        if !name.chars().all(is_lower_tchar) {
            return Err(ConfigError::Invalid(
                "gateway.tool_call_header must be a lowercase http header name".to_string(),
            ));
        }
        if RESERVED_HEADERS.contains(&name) {
            return Err(ConfigError::Invalid(format!(
                "gateway.tool_call_header cannot reuse reserved header {name}"
            )));
        }
        validate_limit("gateway.max_header_bytes", self.max_header_bytes, MAX_HEADER_BYTES)
    }
}

// ============================================================================
// SECTION: Policy Service
// ============================================================================

/// External policy-service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyServiceConfig {
    /// Decision endpoint receiving `{"input": {"tool_call": ...}}`.
    #[serde(default = "default_policy_url")]
    pub url: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_policy_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds.
    #[serde(default = "default_policy_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum accepted response size in bytes.
    #[serde(default = "default_policy_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for PolicyServiceConfig {
    fn default() -> Self {
        Self {
            url: default_policy_url(),
            connect_timeout_ms: default_policy_connect_timeout_ms(),
            request_timeout_ms: default_policy_request_timeout_ms(),
            max_response_bytes: default_policy_max_response_bytes(),
        }
    }
}

impl PolicyServiceConfig {
    /// Validates policy-service configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("policy.url", &self.url)?;
        validate_timeouts("policy", self.connect_timeout_ms, self.request_timeout_ms)?;
        validate_limit("policy.max_response_bytes", self.max_response_bytes, MAX_RESPONSE_BYTES)
    }
}

// ============================================================================
// SECTION: GitHub
// ============================================================================

/// Upstream GitHub API configuration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    /// API token; usually supplied through `GITHUB_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    /// User-Agent sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_github_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds.
    #[serde(default = "default_github_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum accepted response size in bytes.
    #[serde(default = "default_github_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            token: None,
            user_agent: default_user_agent(),
            connect_timeout_ms: default_github_connect_timeout_ms(),
            request_timeout_ms: default_github_request_timeout_ms(),
            max_response_bytes: default_github_max_response_bytes(),
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

impl GitHubConfig {
    /// Validates GitHub configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("github.api_base", &self.api_base)?;
        if let Some(token) = &self.token {
            validate_secret("github.token", token, MAX_AUTH_TOKEN_LENGTH)?;
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() || agent.len() > 256 || agent.chars().any(char::is_control) {
            return Err(ConfigError::Invalid(
                "github.user_agent must be 1-256 printable characters".to_string(),
            ));
        }
        validate_timeouts("github", self.connect_timeout_ms, self.request_timeout_ms)?;
        validate_limit("github.max_response_bytes", self.max_response_bytes, MAX_RESPONSE_BYTES)
    }
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Authorization metadata advertised to clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Issuer URL of the authorization server.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Scopes the protected resource understands.
    #[serde(default = "default_scopes")]
    pub scopes_supported: Vec<String>,
    /// Supported bearer token transmission methods.
    #[serde(default = "default_bearer_methods")]
    pub bearer_methods_supported: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            issuer: None,
            scopes_supported: default_scopes(),
            bearer_methods_supported: default_bearer_methods(),
        }
    }
}

impl IdentityConfig {
    /// Validates identity configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(issuer) = &self.issuer {
            validate_http_url("identity.issuer", issuer)?;
        }
        for scope in &self.scopes_supported {
            if scope.trim().is_empty() || scope.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "identity.scopes_supported entries must be non-empty tokens".to_string(),
                ));
            }
        }
        for method in &self.bearer_methods_supported {
            if !KNOWN_BEARER_METHODS.contains(&method.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "identity.bearer_methods_supported has unknown method {method}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI, environment, or the default file.
/// Returns `None` when no file applies and built-in defaults should be used.
fn resolve_path(
    path: Option<&Path>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates that a string is an absolute http(s) URL with a host.
fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http:// or https://")));
    }
    if url.host().is_none() {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(format!("{field} must not embed credentials")));
    }
    Ok(url)
}

/// Validates a secret value without echoing it.
fn validate_secret(field: &str, value: &str, max_len: usize) -> Result<(), ConfigError> {
    if value.is_empty() || value.len() > max_len {
        return Err(ConfigError::Invalid(format!("{field} entries must be 1-{max_len} bytes")));
    }
    if value.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(ConfigError::Invalid(format!(
            "{field} entries must not contain whitespace or control characters"
        )));
    }
    Ok(())
}

/// Validates connect/request timeout bounds.
fn validate_timeouts(section: &str, connect_ms: u64, request_ms: u64) -> Result<(), ConfigError> {
    if !(MIN_CONNECT_TIMEOUT_MS ..= MAX_CONNECT_TIMEOUT_MS).contains(&connect_ms) {
        return Err(ConfigError::Invalid(format!(
            "{section}.connect_timeout_ms must be between {MIN_CONNECT_TIMEOUT_MS} and \
             {MAX_CONNECT_TIMEOUT_MS}"
        )));
    }
    if !(MIN_REQUEST_TIMEOUT_MS ..= MAX_REQUEST_TIMEOUT_MS).contains(&request_ms) {
        return Err(ConfigError::Invalid(format!(
            "{section}.request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
             {MAX_REQUEST_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Validates a non-zero size limit with an upper bound.
fn validate_limit(field: &str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between 1 and {max}")));
    }
    Ok(())
}

/// Returns true for characters allowed in a lowercase HTTP header name.
const fn is_lower_tchar(ch: char) -> bool {
    ch.is_ascii_lowercase()
        || ch.is_ascii_digit()
        || matches!(
            ch,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

/// Returns true when a URL uses plain http to a host other than loopback.
fn is_plain_http_remote(value: &str) -> bool {
    let Ok(url) = Url::parse(value) else {
        return false;
    };
    if url.scheme() != "http" {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => domain != "localhost",
        Some(Host::Ipv4(ip)) => !ip.is_loopback(),
        Some(Host::Ipv6(ip)) => !ip.is_loopback(),
        None => false,
    }
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// Default maximum request body size in bytes.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Audit logging is on by default.
const fn default_audit_enabled() -> bool {
    true
}

/// Default tool-call header name.
fn default_tool_call_header() -> String {
    "x-mcp-tool-call".to_string()
}

/// Default maximum tool-call header size in bytes.
const fn default_max_header_bytes() -> usize {
    8 * 1024
}

/// Tool calls must pass through the gateway by default.
const fn default_require_gated_tool_calls() -> bool {
    true
}

/// Default policy decision endpoint.
fn default_policy_url() -> String {
    "http://localhost:8181/v1/data/policies/main".to_string()
}

/// Default policy-service connect timeout.
const fn default_policy_connect_timeout_ms() -> u64 {
    500
}

/// Default policy-service request timeout.
const fn default_policy_request_timeout_ms() -> u64 {
    2_000
}

/// Default policy-service response limit.
const fn default_policy_max_response_bytes() -> usize {
    1024 * 1024
}

/// Default GitHub REST API base URL.
fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

/// Default upstream User-Agent.
fn default_user_agent() -> String {
    concat!("policy-gate/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Default GitHub connect timeout.
const fn default_github_connect_timeout_ms() -> u64 {
    2_000
}

/// Default GitHub request timeout.
const fn default_github_request_timeout_ms() -> u64 {
    10_000
}

/// Default GitHub response limit.
const fn default_github_max_response_bytes() -> usize {
    8 * 1024 * 1024
}

/// Default advertised scopes.
fn default_scopes() -> Vec<String> {
    vec!["read".to_string(), "write".to_string()]
}

/// Default advertised bearer methods.
fn default_bearer_methods() -> Vec<String> {
    vec!["header".to_string(), "body".to_string()]
}

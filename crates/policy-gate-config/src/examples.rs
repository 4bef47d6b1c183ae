// crates/policy-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `policy-gate.toml`. The example must always parse and
//! validate; a test in this crate enforces it.

/// Returns a canonical example `policy-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8000"
max_body_bytes = 1048576
# public_base_url = "https://mcp.example.com"

[server.auth]
mode = "upstream"
# mode = "bearer_token"
# bearer_tokens = ["change-me"]

[server.audit]
enabled = true
# path = "/var/log/policy-gate/audit.jsonl"

[server.cors]
allowed_origins = ["*"]

[gateway]
tool_call_header = "x-mcp-tool-call"
max_header_bytes = 8192
require_gated_tool_calls = true

[policy]
url = "http://localhost:8181/v1/data/policies/main"
connect_timeout_ms = 500
request_timeout_ms = 2000
max_response_bytes = 1048576

[github]
api_base = "https://api.github.com"
# token is read from GITHUB_TOKEN
connect_timeout_ms = 2000
request_timeout_ms = 10000
max_response_bytes = 8388608

[identity]
# issuer = "https://auth.example.com"
scopes_supported = ["read", "write"]
bearer_methods_supported = ["header", "body"]
"#,
    )
}

// crates/policy-gate-core/src/tooling.rs
// ============================================================================
// Module: Tooling Identifiers
// Description: Canonical tool identifiers and discovery definitions.
// Purpose: Shared tool naming across the gateway, dispatch layer, and CLI.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Canonical tool identifiers exposed by Policy Gate. These names are part of
//! the external contract surface: callers name them in the tool-call header
//! and in JSON-RPC `tools/call` requests, and policies match on them.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

/// Canonical tool names for Policy Gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Fetch repository metadata.
    GetRepoInfo,
    /// Fetch the head commit of a branch.
    GetLatestCommit,
    /// Fetch a commit with per-file changes.
    GetCommitDiff,
    /// List recent commits on a branch.
    GetRecentCommits,
    /// Fetch a file's decoded contents.
    GetFileContent,
    /// List repository branches.
    GetBranches,
    /// Compare two refs.
    CompareCommits,
    /// Search public repositories.
    SearchRepositories,
    /// List a user's repositories.
    GetUserRepos,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetRepoInfo => "get_repo_info",
            Self::GetLatestCommit => "get_latest_commit",
            Self::GetCommitDiff => "get_commit_diff",
            Self::GetRecentCommits => "get_recent_commits",
            Self::GetFileContent => "get_file_content",
            Self::GetBranches => "get_branches",
            Self::CompareCommits => "compare_commits",
            Self::SearchRepositories => "search_repositories",
            Self::GetUserRepos => "get_user_repos",
        }
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::GetRepoInfo,
            Self::GetLatestCommit,
            Self::GetCommitDiff,
            Self::GetRecentCommits,
            Self::GetFileContent,
            Self::GetBranches,
            Self::CompareCommits,
            Self::SearchRepositories,
            Self::GetUserRepos,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "get_repo_info" => Some(Self::GetRepoInfo),
            "get_latest_commit" => Some(Self::GetLatestCommit),
            "get_commit_diff" => Some(Self::GetCommitDiff),
            "get_recent_commits" => Some(Self::GetRecentCommits),
            "get_file_content" => Some(Self::GetFileContent),
            "get_branches" => Some(Self::GetBranches),
            "compare_commits" => Some(Self::CompareCommits),
            "search_repositories" => Some(Self::SearchRepositories),
            "get_user_repos" => Some(Self::GetUserRepos),
            _ => None,
        }
    }

    /// Returns the human-readable tool description used for discovery.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GetRepoInfo => "Get repository information from GitHub.",
            Self::GetLatestCommit => "Get the latest commit from a repository branch.",
            Self::GetCommitDiff => "Get detailed diff for a specific commit.",
            Self::GetRecentCommits => "Get recent commits from a repository.",
            Self::GetFileContent => "Get content of a specific file from repository.",
            Self::GetBranches => "Get all branches from a repository.",
            Self::CompareCommits => "Compare two commits/branches and get the diff.",
            Self::SearchRepositories => "Search for repositories on GitHub.",
            Self::GetUserRepos => "Get repositories for a specific user.",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Tool definition advertised through MCP `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Canonical tool name.
    pub name: ToolName,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON schema describing the tool arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Returns discovery definitions for every tool in canonical order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::all()
        .iter()
        .map(|tool| ToolDefinition {
            name: *tool,
            description: tool.description(),
            input_schema: input_schema(*tool),
        })
        .collect()
}

/// Builds the JSON input schema for a tool.
fn input_schema(tool: ToolName) -> Value {
    let (properties, required) = match tool {
        ToolName::GetRepoInfo | ToolName::GetBranches => {
            (json!({"owner": string_prop(), "repo": string_prop()}), vec!["owner", "repo"])
        }
        ToolName::GetLatestCommit => (
            json!({
                "owner": string_prop(),
                "repo": string_prop(),
                "branch": string_default("main"),
            }),
            vec!["owner", "repo"],
        ),
        ToolName::GetCommitDiff => (
            json!({
                "owner": string_prop(),
                "repo": string_prop(),
                "commit_sha": string_prop(),
            }),
            vec!["owner", "repo", "commit_sha"],
        ),
        ToolName::GetRecentCommits => (
            json!({
                "owner": string_prop(),
                "repo": string_prop(),
                "count": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10},
                "branch": string_default("main"),
            }),
            vec!["owner", "repo"],
        ),
        ToolName::GetFileContent => (
            json!({
                "owner": string_prop(),
                "repo": string_prop(),
                "file_path": string_prop(),
                "branch": string_default("main"),
            }),
            vec!["owner", "repo", "file_path"],
        ),
        ToolName::CompareCommits => (
            json!({
                "owner": string_prop(),
                "repo": string_prop(),
                "base": string_prop(),
                "head": string_prop(),
            }),
            vec!["owner", "repo", "base", "head"],
        ),
        ToolName::SearchRepositories => (
            json!({
                "query": string_prop(),
                "language": string_default(""),
                "sort": string_default("updated"),
            }),
            vec!["query"],
        ),
        ToolName::GetUserRepos => (
            json!({
                "username": string_prop(),
                "type": string_default("all"),
            }),
            vec!["username"],
        ),
    };
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Required non-empty string property.
fn string_prop() -> Value {
    json!({"type": "string", "minLength": 1})
}

/// Optional string property with a default.
fn string_default(default: &str) -> Value {
    json!({"type": "string", "default": default})
}

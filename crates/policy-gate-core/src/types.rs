// crates/policy-gate-core/src/types.rs
// ============================================================================
// Module: Tool Arguments and Results
// Description: Typed argument and result payloads for each tool.
// Purpose: Give every tool a strict input schema and a stable output shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Argument structs reject unknown fields so a tool call cannot smuggle
//! parameters the policy never saw. Result structs are the reshaped
//! upstream payloads returned to callers.

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default branch used when a tool omits one.
pub const DEFAULT_BRANCH: &str = "main";
/// Default number of commits returned by `get_recent_commits`.
pub const DEFAULT_COMMIT_COUNT: u32 = 10;
/// Upper bound accepted by the upstream API for a single page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Serde default for branch arguments.
fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

/// Serde default for commit counts.
const fn default_count() -> u32 {
    DEFAULT_COMMIT_COUNT
}

/// Serde default for the search sort key.
fn default_sort() -> String {
    "updated".to_string()
}

/// Serde default for the repository type filter.
fn default_repo_type() -> String {
    "all".to_string()
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Arguments naming a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

/// Arguments for `get_latest_commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatestCommitArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch name.
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Arguments for `get_commit_diff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitDiffArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Commit SHA.
    pub commit_sha: String,
}

/// Arguments for `get_recent_commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecentCommitsArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Number of commits to return.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Branch name.
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Arguments for `get_file_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileContentArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Path of the file inside the repository.
    pub file_path: String,
    /// Branch or ref name.
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Arguments for `compare_commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareArgs {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Base ref.
    pub base: String,
    /// Head ref.
    pub head: String,
}

/// Arguments for `search_repositories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    /// Free-text search query.
    pub query: String,
    /// Optional language qualifier; empty means any.
    #[serde(default)]
    pub language: String,
    /// Sort key.
    #[serde(default = "default_sort")]
    pub sort: String,
}

/// Arguments for `get_user_repos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserReposArgs {
    /// Account login.
    pub username: String,
    /// Repository type filter.
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Repository information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Repository name.
    pub name: String,
    /// Owner-qualified name.
    pub full_name: String,
    /// Repository description.
    pub description: Option<String>,
    /// Default branch name.
    pub default_branch: String,
    /// HTTPS clone URL.
    pub clone_url: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Commit information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit SHA hash.
    pub sha: String,
    /// Commit message.
    pub message: String,
    /// Commit author.
    pub author: String,
    /// Commit date.
    pub date: String,
    /// Commit URL.
    pub url: String,
}

/// File change information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Changed file path.
    pub filename: String,
    /// Change status (added/modified/removed).
    pub status: String,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// File diff patch.
    pub patch: Option<String>,
}

/// Complete commit diff information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDiff {
    /// Commit metadata.
    pub commit: CommitInfo,
    /// Per-file changes.
    pub files: Vec<FileChange>,
    /// Total lines added.
    pub total_additions: u64,
    /// Total lines deleted.
    pub total_deletions: u64,
}

/// Decoded file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Requested path.
    pub path: String,
    /// UTF-8 file contents.
    pub content: String,
    /// Blob SHA.
    pub sha: String,
    /// Size in bytes as reported upstream.
    pub size: u64,
    /// Raw download URL, empty when unavailable.
    pub download_url: String,
}

/// Branch information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Branch name.
    pub name: String,
    /// Head commit SHA.
    pub sha: String,
    /// Whether branch protection is enabled.
    pub protected: bool,
}

/// File entry in a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedFile {
    /// Changed file path.
    pub filename: String,
    /// Change status.
    pub status: String,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Total changed lines.
    pub changes: u64,
    /// File diff patch, empty when unavailable.
    pub patch: String,
}

/// Comparison between two refs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitComparison {
    /// Base ref as requested.
    pub base: String,
    /// Head ref as requested.
    pub head: String,
    /// Commits head is ahead of base.
    pub ahead_by: u64,
    /// Commits head is behind base.
    pub behind_by: u64,
    /// Commits in the comparison.
    pub total_commits: u64,
    /// Changed files.
    pub files: Vec<ComparedFile>,
    /// Comparison status (ahead/behind/diverged/identical).
    pub status: String,
    /// Permanent comparison URL.
    pub permalink_url: String,
}

/// Repository search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    /// Repository name.
    pub name: String,
    /// Owner-qualified name.
    pub full_name: String,
    /// Description, empty when unset.
    pub description: String,
    /// Primary language, empty when unknown.
    pub language: String,
    /// Stargazer count.
    pub stars: u64,
    /// Fork count.
    pub forks: u64,
    /// Last update timestamp.
    pub updated_at: String,
    /// Web URL.
    pub html_url: String,
}

/// Repository owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRepo {
    /// Summary fields shared with search results.
    #[serde(flatten)]
    pub summary: RepoSummary,
    /// HTTPS clone URL.
    pub clone_url: String,
}

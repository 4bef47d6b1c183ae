// crates/policy-gate-github/src/tools.rs
// ============================================================================
// Module: GitHub Tools
// Description: Tool dispatch onto the GitHub REST API.
// Purpose: Execute each read-only tool with one upstream request.
// Dependencies: policy-gate-core, async-trait, base64, serde
// ============================================================================

//! ## Overview
//! [`ToolDispatcher`] is the seam between the MCP surface and the upstream
//! API: it receives a tool identifier with raw JSON arguments and returns the
//! JSON result. [`GitHubTools`] is the production implementation. Arguments
//! are decoded strictly and checked before any upstream request is made.
//! Upstream failures are surfaced to the caller, never swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use policy_gate_core::ToolName;
use policy_gate_core::types::BranchInfo;
use policy_gate_core::types::CommitComparison;
use policy_gate_core::types::CommitDiff;
use policy_gate_core::types::CommitDiffArgs;
use policy_gate_core::types::CommitInfo;
use policy_gate_core::types::CompareArgs;
use policy_gate_core::types::ComparedFile;
use policy_gate_core::types::FileChange;
use policy_gate_core::types::FileContent;
use policy_gate_core::types::FileContentArgs;
use policy_gate_core::types::LatestCommitArgs;
use policy_gate_core::types::MAX_PAGE_SIZE;
use policy_gate_core::types::RecentCommitsArgs;
use policy_gate_core::types::RepoArgs;
use policy_gate_core::types::RepoInfo;
use policy_gate_core::types::RepoSummary;
use policy_gate_core::types::SearchArgs;
use policy_gate_core::types::UserRepo;
use policy_gate_core::types::UserReposArgs;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::client::GitHubClient;
use crate::client::UpstreamError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Page size for repository search.
const SEARCH_PAGE_SIZE: &str = "10";
/// Page size for user repository listings.
const USER_REPOS_PAGE_SIZE: &str = "20";
/// Repository type filters accepted by the user listing endpoint.
const USER_REPO_TYPES: &[&str] = &["all", "owner", "member"];

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Executes tool calls that already passed policy evaluation.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Runs `tool` with raw JSON `arguments` and returns the JSON result.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when arguments are invalid or the upstream call
    /// fails.
    async fn dispatch(&self, tool: ToolName, arguments: Value) -> Result<Value, ToolError>;
}

/// GitHub-backed tool dispatcher.
#[derive(Debug, Clone)]
pub struct GitHubTools {
    /// Upstream API client.
    client: GitHubClient,
}

#[async_trait]
impl ToolDispatcher for GitHubTools {
    async fn dispatch(&self, tool: ToolName, arguments: Value) -> Result<Value, ToolError> {
        let upstream = |source: UpstreamError| ToolError::Upstream {
            tool,
            source,
        };
        match tool {
            ToolName::GetRepoInfo => {
                let args: RepoArgs = parse_args(arguments)?;
                to_json(&self.get_repo_info(&args).await.map_err(upstream)?)
            }
            ToolName::GetLatestCommit => {
                let args: LatestCommitArgs = parse_args(arguments)?;
                to_json(&self.get_latest_commit(&args).await.map_err(upstream)?)
            }
            ToolName::GetCommitDiff => {
                let args: CommitDiffArgs = parse_args(arguments)?;
                to_json(&self.get_commit_diff(&args).await.map_err(upstream)?)
            }
            ToolName::GetRecentCommits => {
                let args: RecentCommitsArgs = parse_args(arguments)?;
                to_json(&self.get_recent_commits(&args).await.map_err(upstream)?)
            }
            ToolName::GetFileContent => {
                let args: FileContentArgs = parse_args(arguments)?;
                to_json(&self.get_file_content(&args).await.map_err(upstream)?)
            }
            ToolName::GetBranches => {
                let args: RepoArgs = parse_args(arguments)?;
                to_json(&self.get_branches(&args).await.map_err(upstream)?)
            }
            ToolName::CompareCommits => {
                let args: CompareArgs = parse_args(arguments)?;
                to_json(&self.compare_commits(&args).await.map_err(upstream)?)
            }
            ToolName::SearchRepositories => {
                let args: SearchArgs = parse_args(arguments)?;
                to_json(&self.search_repositories(&args).await.map_err(upstream)?)
            }
            ToolName::GetUserRepos => {
                let args: UserReposArgs = parse_args(arguments)?;
                to_json(&self.get_user_repos(&args).await.map_err(upstream)?)
            }
        }
    }
}

impl GitHubTools {
    /// Creates a dispatcher over the given client.
    #[must_use]
    pub const fn new(client: GitHubClient) -> Self {
        Self {
            client,
        }
    }

    /// Fetches repository information.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn get_repo_info(&self, args: &RepoArgs) -> Result<RepoInfo, UpstreamError> {
        self.client.get_json(&["repos", args.owner.as_str(), args.repo.as_str()], &[]).await
    }

    /// Fetches the head commit of a branch.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn get_latest_commit(
        &self,
        args: &LatestCommitArgs,
    ) -> Result<CommitInfo, UpstreamError> {
        let commit: CommitPayload = self
            .client
            .get_json(
                &[
                    "repos",
                    args.owner.as_str(),
                    args.repo.as_str(),
                    "commits",
                    args.branch.as_str(),
                ],
                &[],
            )
            .await?;
        Ok(commit.into_info())
    }

    /// Fetches a commit together with its per-file changes.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn get_commit_diff(
        &self,
        args: &CommitDiffArgs,
    ) -> Result<CommitDiff, UpstreamError> {
        let mut commit: CommitPayload = self
            .client
            .get_json(
                &[
                    "repos",
                    args.owner.as_str(),
                    args.repo.as_str(),
                    "commits",
                    args.commit_sha.as_str(),
                ],
                &[],
            )
            .await?;
        let files: Vec<FileChange> = std::mem::take(&mut commit.files)
            .into_iter()
            .map(|file| FileChange {
                filename: file.filename,
                status: file.status,
                additions: file.additions,
                deletions: file.deletions,
                patch: file.patch,
            })
            .collect();
        let total_additions =
            files.iter().fold(0_u64, |total, file| total.saturating_add(file.additions));
        let total_deletions =
            files.iter().fold(0_u64, |total, file| total.saturating_add(file.deletions));
        Ok(CommitDiff {
            commit: commit.into_info(),
            files,
            total_additions,
            total_deletions,
        })
    }

    /// Lists recent commits on a branch. `count` is clamped to the upstream
    /// page size.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn get_recent_commits(
        &self,
        args: &RecentCommitsArgs,
    ) -> Result<Vec<CommitInfo>, UpstreamError> {
        let per_page = args.count.clamp(1, MAX_PAGE_SIZE).to_string();
        let commits: Vec<CommitPayload> = self
            .client
            .get_json(
                &["repos", args.owner.as_str(), args.repo.as_str(), "commits"],
                &[("sha", args.branch.as_str()), ("per_page", per_page.as_str())],
            )
            .await?;
        Ok(commits.into_iter().map(CommitPayload::into_info).collect())
    }

    /// Fetches and decodes a file.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails or the path
    /// is not a UTF-8 file.
    pub async fn get_file_content(
        &self,
        args: &FileContentArgs,
    ) -> Result<FileContent, UpstreamError> {
        let mut segments = vec!["repos", args.owner.as_str(), args.repo.as_str(), "contents"];
        segments.extend(args.file_path.split('/'));
        let value: Value =
            self.client.get_json(&segments, &[("ref", args.branch.as_str())]).await?;
        if value.get("type").and_then(Value::as_str) != Some("file") {
            return Err(UpstreamError::Decode(format!("path is not a file: {}", args.file_path)));
        }
        let payload: ContentPayload =
            serde_json::from_value(value).map_err(|err| UpstreamError::Decode(err.to_string()))?;
        let encoded: String =
            payload.content.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|err| UpstreamError::Decode(format!("invalid base64 content: {err}")))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| UpstreamError::Decode("file content is not valid utf-8".to_string()))?;
        Ok(FileContent {
            path: args.file_path.clone(),
            content,
            sha: payload.sha,
            size: payload.size,
            download_url: payload.download_url.unwrap_or_default(),
        })
    }

    /// Lists repository branches.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn get_branches(&self, args: &RepoArgs) -> Result<Vec<BranchInfo>, UpstreamError> {
        let branches: Vec<BranchPayload> = self
            .client
            .get_json(&["repos", args.owner.as_str(), args.repo.as_str(), "branches"], &[])
            .await?;
        Ok(branches
            .into_iter()
            .map(|branch| BranchInfo {
                name: branch.name,
                sha: branch.commit.sha,
                protected: branch.protected,
            })
            .collect())
    }

    /// Compares two refs.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn compare_commits(
        &self,
        args: &CompareArgs,
    ) -> Result<CommitComparison, UpstreamError> {
        let range = format!("{}...{}", args.base, args.head);
        let payload: ComparePayload = self
            .client
            .get_json(
                &["repos", args.owner.as_str(), args.repo.as_str(), "compare", range.as_str()],
                &[],
            )
            .await?;
        Ok(CommitComparison {
            base: args.base.clone(),
            head: args.head.clone(),
            ahead_by: payload.ahead_by,
            behind_by: payload.behind_by,
            total_commits: payload.total_commits,
            files: payload
                .files
                .into_iter()
                .map(|file| ComparedFile {
                    filename: file.filename,
                    status: file.status,
                    additions: file.additions,
                    deletions: file.deletions,
                    changes: file.changes,
                    patch: file.patch.unwrap_or_default(),
                })
                .collect(),
            status: payload.status,
            permalink_url: payload.permalink_url,
        })
    }

    /// Searches repositories, newest activity first.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn search_repositories(
        &self,
        args: &SearchArgs,
    ) -> Result<Vec<RepoSummary>, UpstreamError> {
        let query = if args.language.trim().is_empty() {
            args.query.clone()
        } else {
            format!("{} language:{}", args.query, args.language.trim())
        };
        let payload: SearchPayload = self
            .client
            .get_json(
                &["search", "repositories"],
                &[
                    ("q", query.as_str()),
                    ("sort", args.sort.as_str()),
                    ("order", "desc"),
                    ("per_page", SEARCH_PAGE_SIZE),
                ],
            )
            .await?;
        Ok(payload.items.into_iter().map(|repo| repo.into_summary().0).collect())
    }

    /// Lists repositories of a user, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the upstream request fails.
    pub async fn get_user_repos(
        &self,
        args: &UserReposArgs,
    ) -> Result<Vec<UserRepo>, UpstreamError> {
        let repos: Vec<RepoListing> = self
            .client
            .get_json(
                &["users", args.username.as_str(), "repos"],
                &[
                    ("type", args.repo_type.as_str()),
                    ("sort", "updated"),
                    ("per_page", USER_REPOS_PAGE_SIZE),
                ],
            )
            .await?;
        Ok(repos
            .into_iter()
            .map(|repo| {
                let (summary, clone_url) = repo.into_summary();
                UserRepo {
                    summary,
                    clone_url,
                }
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool execution failures.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name is not one of the supported tools.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments failed to decode or validate.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// Upstream request failed.
    #[error("{tool}: {source}")]
    Upstream {
        /// Tool being executed.
        tool: ToolName,
        /// Upstream failure.
        source: UpstreamError,
    },
    /// Tool result could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

// ============================================================================
// SECTION: Argument Checks
// ============================================================================

/// Field-level checks applied after decoding.
trait CheckArgs {
    /// Returns the name of the first invalid field, if any.
    fn invalid_field(&self) -> Option<&'static str>;
}

/// Returns `field` when `value` is blank.
fn blank(field: &'static str, value: &str) -> Option<&'static str> {
    value.trim().is_empty().then_some(field)
}

/// Returns `field` when a repository path has empty, `.`, or `..` segments.
/// URL building normalizes those away, so the fetched path would differ from
/// the one the policy approved.
fn non_canonical_path(field: &'static str, value: &str) -> Option<&'static str> {
    value.split('/').any(|segment| matches!(segment, "" | "." | "..")).then_some(field)
}

impl CheckArgs for RepoArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("owner", &self.owner).or_else(|| blank("repo", &self.repo))
    }
}

impl CheckArgs for LatestCommitArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("owner", &self.owner)
            .or_else(|| blank("repo", &self.repo))
            .or_else(|| blank("branch", &self.branch))
    }
}

impl CheckArgs for CommitDiffArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("owner", &self.owner)
            .or_else(|| blank("repo", &self.repo))
            .or_else(|| blank("commit_sha", &self.commit_sha))
    }
}

impl CheckArgs for RecentCommitsArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("owner", &self.owner)
            .or_else(|| blank("repo", &self.repo))
            .or_else(|| blank("branch", &self.branch))
    }
}

impl CheckArgs for FileContentArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("owner", &self.owner)
            .or_else(|| blank("repo", &self.repo))
            .or_else(|| blank("file_path", &self.file_path))
            .or_else(|| non_canonical_path("file_path", &self.file_path))
            .or_else(|| blank("branch", &self.branch))
    }
}

impl CheckArgs for CompareArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("owner", &self.owner)
            .or_else(|| blank("repo", &self.repo))
            .or_else(|| blank("base", &self.base))
            .or_else(|| blank("head", &self.head))
    }
}

impl CheckArgs for SearchArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("query", &self.query).or_else(|| blank("sort", &self.sort))
    }
}

impl CheckArgs for UserReposArgs {
    fn invalid_field(&self) -> Option<&'static str> {
        blank("username", &self.username)
            .or_else(|| (!USER_REPO_TYPES.contains(&self.repo_type.as_str())).then_some("type"))
    }
}

/// Decodes and checks tool arguments. `null` is treated as `{}`.
fn parse_args<T: DeserializeOwned + CheckArgs>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let args: T =
        serde_json::from_value(arguments).map_err(|err| ToolError::InvalidParams(err.to_string()))?;
    if let Some(field) = args.invalid_field() {
        return Err(ToolError::InvalidParams(format!("{field} is invalid")));
    }
    Ok(args)
}

/// Serializes a tool result.
fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|err| ToolError::Serialization(err.to_string()))
}

// ============================================================================
// SECTION: Upstream Payloads
// ============================================================================

/// Commit as returned by the commits endpoints.
#[derive(Debug, Deserialize)]
struct CommitPayload {
    /// Commit SHA.
    sha: String,
    /// Git commit details.
    commit: GitCommitPayload,
    /// Web URL.
    #[serde(default)]
    html_url: String,
    /// Changed files (single-commit endpoint only).
    #[serde(default)]
    files: Vec<FilePayload>,
}

impl CommitPayload {
    /// Reshapes into the public commit summary.
    fn into_info(self) -> CommitInfo {
        let author = self.commit.author.unwrap_or_default();
        CommitInfo {
            sha: self.sha,
            message: self.commit.message,
            author: author.name,
            date: author.date,
            url: self.html_url,
        }
    }
}

/// Git-level commit details.
#[derive(Debug, Deserialize)]
struct GitCommitPayload {
    /// Commit message.
    #[serde(default)]
    message: String,
    /// Git author signature.
    #[serde(default)]
    author: Option<SignaturePayload>,
}

/// Git author signature.
#[derive(Debug, Default, Deserialize)]
struct SignaturePayload {
    /// Author name.
    #[serde(default)]
    name: String,
    /// Authoring timestamp.
    #[serde(default)]
    date: String,
}

/// Changed file entry.
#[derive(Debug, Deserialize)]
struct FilePayload {
    /// File path.
    filename: String,
    /// Change status.
    #[serde(default)]
    status: String,
    /// Lines added.
    #[serde(default)]
    additions: u64,
    /// Lines deleted.
    #[serde(default)]
    deletions: u64,
    /// Total changed lines.
    #[serde(default)]
    changes: u64,
    /// Unified diff patch.
    #[serde(default)]
    patch: Option<String>,
}

/// File object from the contents endpoint.
#[derive(Debug, Deserialize)]
struct ContentPayload {
    /// Base64 content with embedded newlines.
    #[serde(default)]
    content: String,
    /// Blob SHA.
    sha: String,
    /// Size in bytes.
    #[serde(default)]
    size: u64,
    /// Raw download URL.
    #[serde(default)]
    download_url: Option<String>,
}

/// Branch entry.
#[derive(Debug, Deserialize)]
struct BranchPayload {
    /// Branch name.
    name: String,
    /// Head commit reference.
    commit: BranchCommitPayload,
    /// Whether branch protection is enabled.
    #[serde(default)]
    protected: bool,
}

/// Head commit reference of a branch.
#[derive(Debug, Deserialize)]
struct BranchCommitPayload {
    /// Commit SHA.
    sha: String,
}

/// Comparison between two refs.
#[derive(Debug, Deserialize)]
struct ComparePayload {
    /// Commits head is ahead of base.
    #[serde(default)]
    ahead_by: u64,
    /// Commits head is behind base.
    #[serde(default)]
    behind_by: u64,
    /// Commits in the comparison.
    #[serde(default)]
    total_commits: u64,
    /// Changed files.
    #[serde(default)]
    files: Vec<FilePayload>,
    /// Comparison status.
    #[serde(default)]
    status: String,
    /// Permanent URL.
    #[serde(default)]
    permalink_url: String,
}

/// Repository search results.
#[derive(Debug, Deserialize)]
struct SearchPayload {
    /// Matching repositories.
    #[serde(default)]
    items: Vec<RepoListing>,
}

/// Repository entry from search and listing endpoints.
#[derive(Debug, Deserialize)]
struct RepoListing {
    /// Repository name.
    name: String,
    /// Owner-qualified name.
    full_name: String,
    /// Description.
    #[serde(default)]
    description: Option<String>,
    /// Primary language.
    #[serde(default)]
    language: Option<String>,
    /// Stargazer count.
    #[serde(default)]
    stargazers_count: u64,
    /// Fork count.
    #[serde(default)]
    forks_count: u64,
    /// Last update timestamp.
    #[serde(default)]
    updated_at: String,
    /// Web URL.
    #[serde(default)]
    html_url: String,
    /// HTTPS clone URL.
    #[serde(default)]
    clone_url: String,
}

impl RepoListing {
    /// Splits into the shared summary and the clone URL.
    fn into_summary(self) -> (RepoSummary, String) {
        (
            RepoSummary {
                name: self.name,
                full_name: self.full_name,
                description: self.description.unwrap_or_default(),
                language: self.language.unwrap_or_default(),
                stars: self.stargazers_count,
                forks: self.forks_count,
                updated_at: self.updated_at,
                html_url: self.html_url,
            },
            self.clone_url,
        )
    }
}

#[cfg(test)]
mod tests;

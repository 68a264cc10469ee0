//! forge::traits
//!
//! Forge trait definition for reading and mutating a hosted repository.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is network I/O.
//! Responses are decoded into the typed records below at the transport
//! boundary; the reconcilers never see raw JSON.
//!
//! Lookups that can legitimately miss (a ref, a path, a commit-ish) return
//! `Ok(None)` rather than `Err(NotFound)`, so callers branch on absence
//! explicitly.
//!
//! # Example
//!
//! ```ignore
//! use ghup::forge::{Forge, ForgeError};
//! use ghup::core::types::RefName;
//!
//! async fn head_of(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let name = RefName::new("refs/heads/main").unwrap();
//!     if let Some(r) = forge.get_ref(&name).await? {
//!         println!("{} -> {}", r.name, r.oid);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::message::CommitMessage;
use crate::core::types::{BranchName, Oid, RefName, RefType, RepoSlug};

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with the GitHub API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The remote rejected a write because its precondition no longer holds
    /// (e.g. the branch moved since the expected head was read).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation is not supported by this forge.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Which merge methods the repository permits, and whether auto-merge is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCapabilities {
    pub auto_merge_allowed: bool,
    pub merge_commit_allowed: bool,
    pub squash_merge_allowed: bool,
    pub rebase_merge_allowed: bool,
}

impl MergeCapabilities {
    /// Whether `method` is enabled for the repository.
    pub fn allows(&self, method: MergeMethod) -> bool {
        match method {
            MergeMethod::Merge => self.merge_commit_allowed,
            MergeMethod::Squash => self.squash_merge_allowed,
            MergeMethod::Rebase => self.rebase_merge_allowed,
        }
    }

    /// Enabled methods, in `merge, squash, rebase` order.
    pub fn supported(&self) -> Vec<MergeMethod> {
        [MergeMethod::Merge, MergeMethod::Squash, MergeMethod::Rebase]
            .into_iter()
            .filter(|m| self.allows(*m))
            .collect()
    }
}

/// Repository metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// GraphQL node id
    pub node_id: String,
    /// True if the repository has no commits at all
    pub is_empty: bool,
    /// Default branch name
    pub default_branch: String,
    /// Head of the default branch (absent in an empty repository)
    pub default_branch_oid: Option<Oid>,
    pub merge: MergeCapabilities,
}

/// What a ref points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Commit,
    /// An annotated tag object
    Tag,
}

/// A ref as reported by the remote, unpeeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub name: RefName,
    /// The object the ref points at directly
    pub oid: Oid,
    pub kind: ObjectKind,
}

/// An annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagObject {
    /// Id of the tag object itself
    pub oid: Oid,
    /// Tag name
    pub tag: String,
    pub message: String,
    /// The commit the tag object points at
    pub target: Oid,
}

/// A ref with its peeled commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: RefName,
    pub commit: Oid,
}

/// A file to add or replace in a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAddition {
    pub path: String,
    pub contents: Vec<u8>,
}

/// Request to create one commit on a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub branch: BranchName,
    /// The commit is rejected unless the branch still points here
    pub expected_head: Oid,
    pub message: CommitMessage,
    pub additions: Vec<FileAddition>,
    pub deletions: Vec<String>,
}

/// Request to create a pull request.
#[derive(Debug, Clone)]
pub struct CreatePrRequest {
    /// Head branch name (the branch with changes)
    pub head: String,
    /// Base branch name (the branch to merge into)
    pub base: String,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: Option<String>,
    /// Create as draft
    pub draft: bool,
}

/// Pull request information returned from the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR URL (web URL for viewing)
    pub url: String,
    /// Whether the PR is a draft
    pub is_draft: bool,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// PR title
    pub title: String,
    /// GraphQL node ID (for auto-merge mutations)
    #[serde(skip)]
    pub node_id: Option<String>,
}

/// Merge method for merging a PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    Merge,
    /// Squash all commits and merge
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl MergeMethod {
    /// The GraphQL `PullRequestMergeMethod` value.
    pub fn graphql_name(self) -> &'static str {
        match self {
            MergeMethod::Merge => "MERGE",
            MergeMethod::Squash => "SQUASH",
            MergeMethod::Rebase => "REBASE",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeMethod::Merge => write!(f, "merge"),
            MergeMethod::Squash => write!(f, "squash"),
            MergeMethod::Rebase => write!(f, "rebase"),
        }
    }
}

/// State of a deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    #[default]
    Success,
    Pending,
    Failure,
    Error,
    #[value(name = "in_progress")]
    InProgress,
    Queued,
    Inactive,
}

impl DeploymentState {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentState::Success => "success",
            DeploymentState::Pending => "pending",
            DeploymentState::Failure => "failure",
            DeploymentState::Error => "error",
            DeploymentState::InProgress => "in_progress",
            DeploymentState::Queued => "queued",
            DeploymentState::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub id: u64,
    pub sha: Oid,
    pub environment: String,
}

/// Request to create a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub sha: Oid,
    pub environment: String,
    pub description: Option<String>,
    pub transient: bool,
    pub production: bool,
}

/// Request to add a status to a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatusRequest {
    pub state: DeploymentState,
    pub description: Option<String>,
    pub environment_url: Option<String>,
}

/// A created deployment status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub id: u64,
    pub state: DeploymentState,
}

/// The Forge trait for interacting with the hosted repository.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: bad or missing token
/// - `Conflict`: a write precondition failed; not retried
/// - `RateLimited`: surfaced once the transport gives up
/// - `ApiError`: display the message
/// - `NetworkError`: check connectivity
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// The repository this forge operates on.
    fn repository(&self) -> &RepoSlug;

    /// Web URL of a commit.
    fn commit_url(&self, sha: &Oid) -> String;

    /// Repository metadata (default branch, empty flag, merge settings).
    async fn repository_info(&self) -> Result<RepositoryInfo, ForgeError>;

    /// Look up a commit by full or abbreviated hash.
    ///
    /// Returns the canonical full-length id, or `None` if no commit matches.
    async fn commit_sha(&self, hash: &str) -> Result<Option<Oid>, ForgeError>;

    /// Resolve a symbolic expression (`main`, `v1.0.0`, `main~1`) to a commit.
    ///
    /// Tags are peeled to the commit they point at.
    async fn resolve_expression(&self, expression: &str) -> Result<Option<Oid>, ForgeError>;

    /// Blob id of `path` at the head of `branch`, `None` if absent.
    async fn file_oid(&self, branch: &str, path: &str) -> Result<Option<Oid>, ForgeError>;

    /// Text content of `path` at `branch`. Binary or missing files yield `None`.
    async fn file_text(&self, branch: &str, path: &str) -> Result<Option<String>, ForgeError>;

    /// Read a ref without peeling it.
    async fn get_ref(&self, name: &RefName) -> Result<Option<RemoteRef>, ForgeError>;

    /// Create a ref; fails if it already exists.
    async fn create_ref(&self, name: &RefName, oid: &Oid) -> Result<(), ForgeError>;

    /// Move an existing ref. `force` permits non-fast-forward moves.
    async fn update_ref(&self, name: &RefName, oid: &Oid, force: bool)
        -> Result<(), ForgeError>;

    /// Delete a ref.
    async fn delete_ref(&self, name: &RefName) -> Result<(), ForgeError>;

    /// Create an annotated tag object pointing at `target`; returns its id.
    ///
    /// This does not create the `refs/tags/...` ref.
    async fn create_tag_object(
        &self,
        tag: &str,
        message: &str,
        target: &Oid,
    ) -> Result<Oid, ForgeError>;

    /// Read an annotated tag object.
    async fn get_tag_object(&self, oid: &Oid) -> Result<TagObject, ForgeError>;

    /// All refs of a type, peeled to commits.
    async fn list_refs(&self, ref_type: RefType) -> Result<Vec<RefEntry>, ForgeError>;

    /// Create one commit on a branch, guarded by the expected head.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the branch no longer points at `expected_head`
    async fn create_commit(&self, request: CommitRequest) -> Result<Oid, ForgeError>;

    /// Find an open, same-repository pull request from `head` into `base`.
    async fn find_pull_request(
        &self,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, ForgeError>;

    /// Create a new pull request.
    async fn create_pull_request(&self, request: CreatePrRequest)
        -> Result<PullRequest, ForgeError>;

    /// Enable auto-merge on a pull request.
    async fn enable_auto_merge(
        &self,
        pr: &PullRequest,
        method: MergeMethod,
    ) -> Result<(), ForgeError>;

    /// Deployments for `sha` in `environment`, newest first.
    async fn list_deployments(
        &self,
        sha: &Oid,
        environment: &str,
    ) -> Result<Vec<Deployment>, ForgeError>;

    /// Create a deployment.
    async fn create_deployment(
        &self,
        request: DeploymentRequest,
    ) -> Result<Deployment, ForgeError>;

    /// Add a status to a deployment.
    async fn create_deployment_status(
        &self,
        deployment_id: u64,
        request: DeploymentStatusRequest,
    ) -> Result<DeploymentStatus, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_method_display() {
        assert_eq!(format!("{}", MergeMethod::Merge), "merge");
        assert_eq!(format!("{}", MergeMethod::Squash), "squash");
        assert_eq!(format!("{}", MergeMethod::Rebase), "rebase");
        assert_eq!(MergeMethod::Squash.graphql_name(), "SQUASH");
    }

    #[test]
    fn capabilities() {
        let caps = MergeCapabilities {
            auto_merge_allowed: true,
            merge_commit_allowed: true,
            squash_merge_allowed: false,
            rebase_merge_allowed: true,
        };
        assert!(caps.allows(MergeMethod::Merge));
        assert!(!caps.allows(MergeMethod::Squash));
        assert_eq!(
            caps.supported(),
            vec![MergeMethod::Merge, MergeMethod::Rebase]
        );
    }

    #[test]
    fn deployment_state_names() {
        assert_eq!(DeploymentState::InProgress.to_string(), "in_progress");
        assert_eq!(
            serde_json::to_string(&DeploymentState::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(DeploymentState::default(), DeploymentState::Success);
    }

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("ref".into())),
            "not found: ref"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 422,
                    message: "Validation failed".into()
                }
            ),
            "API error: 422 - Validation failed"
        );
        assert_eq!(
            format!("{}", ForgeError::Conflict("branch moved".into())),
            "conflict: branch moved"
        );
    }
}

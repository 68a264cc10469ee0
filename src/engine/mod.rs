//! engine
//!
//! Remote-state reconciliation.
//!
//! # Architecture
//!
//! Each reconciler reads the current remote state through a [`Forge`],
//! computes the smallest mutation that reaches the desired state, applies
//! it, and reports what changed. Resolving to an already-matching state is
//! always a no-op, so re-running any command with the same inputs is safe.
//!
//! ```text
//! resolve -> diff -> branch -> commit -> pull_request   (content)
//! resolve -> tag                                          (tag)
//! resolve -> refs                                         (update-ref)
//! resolve -> deployment                                   (deployment)
//! ```
//!
//! Reconcilers take an explicit options struct; nothing here reads flags,
//! environment or files.
//!
//! # Invariants
//!
//! - Every remote call is sequential; there is no internal parallelism
//! - Application-level conflicts are surfaced, never retried
//! - Dry-run performs every read and no write
//!
//! [`Forge`]: crate::forge::Forge

pub mod branch;
pub mod commit;
pub mod content;
pub mod deployment;
pub mod diff;
pub mod pull_request;
pub mod refs;
pub mod resolve;
pub mod tag;

pub use branch::{ensure_branch, BranchState};
pub use commit::{apply_commit, CommitOutcome};
pub use content::{reconcile_content, ContentOptions, ContentReport, PullRequestOptions};
pub use deployment::{reconcile_deployment, DeploymentOptions, DeploymentReport};
pub use diff::{compute_diff, ChangeSet, ContentDiff};
pub use pull_request::{
    ensure_pull_request, negotiate_auto_merge, AutoMergeMode, PullRequestSpec, PullRequestState,
};
pub use refs::{
    reconcile_refs, update_ref, update_refs, RefMutation, RefUpdate, RefUpdateOptions,
    RefUpdateReport, SourceReport, TargetReport,
};
pub use resolve::{
    matching_refs, reconcile_resolve, require_commitish, resolve_commitish, ResolveOptions,
    ResolveReport,
};
pub use tag::{ensure_tag, reconcile_tag, TagOptions, TagReport, TagSpec};

use thiserror::Error;

use crate::core::filespec::SpecError;
use crate::core::types::{Oid, RefName, TypeError};
use crate::forge::ForgeError;

/// Errors from reconciliation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Malformed input, detected before any remote call.
    #[error("{0}")]
    Validation(String),

    /// A commit-ish, ref or branch does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Remote state contradicts the request and force is not set,
    /// or the remote rejected a guarded write.
    #[error("{0}")]
    Conflict(String),

    /// An immutable ref points somewhere else. Nothing was written.
    #[error("{name} is immutable: points to {current}, not {desired}")]
    Diverged {
        name: RefName,
        current: Oid,
        desired: Oid,
    },

    /// The remote repository has no commits.
    #[error("cannot push to empty repository")]
    EmptyRepository,

    /// Transport or authentication failure.
    #[error(transparent)]
    Forge(ForgeError),
}

impl ReconcileError {
    /// True for outcomes that are expected skips rather than failures.
    pub fn is_policy_skip(&self) -> bool {
        matches!(self, ReconcileError::Diverged { .. })
    }
}

impl From<ForgeError> for ReconcileError {
    fn from(e: ForgeError) -> Self {
        match e {
            ForgeError::Conflict(msg) => ReconcileError::Conflict(msg),
            other => ReconcileError::Forge(other),
        }
    }
}

impl From<TypeError> for ReconcileError {
    fn from(e: TypeError) -> Self {
        ReconcileError::Validation(e.to_string())
    }
}

impl From<SpecError> for ReconcileError {
    fn from(e: SpecError) -> Self {
        ReconcileError::Validation(e.to_string())
    }
}

//! engine::commit
//!
//! Apply a content diff as one commit guarded by the expected head.
//!
//! The remote rejects the commit if the branch moved after `expected_head`
//! was read. That rejection surfaces as [`ReconcileError::Conflict`] and is
//! not retried.

use tracing::info;

use super::{diff::ContentDiff, ReconcileError};
use crate::core::message::CommitMessage;
use crate::core::types::{BranchName, Oid};
use crate::forge::{CommitRequest, Forge};

/// Result of [`apply_commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// New head, or the unchanged head when nothing was committed.
    pub sha: Oid,
    /// True if a commit was made (or would be, in dry-run).
    pub updated: bool,
}

/// Commit `diff` on top of `expected_head`.
///
/// An empty diff is a no-op unless `allow_empty` is set. In dry-run the
/// request is not submitted and the outcome reports `updated` with the
/// unchanged head.
pub async fn apply_commit(
    forge: &dyn Forge,
    branch: &BranchName,
    expected_head: &Oid,
    diff: ContentDiff,
    message: CommitMessage,
    allow_empty: bool,
    dry_run: bool,
) -> Result<CommitOutcome, ReconcileError> {
    if diff.is_empty() && !allow_empty {
        info!("no changes to commit on {}", branch);
        return Ok(CommitOutcome {
            sha: expected_head.clone(),
            updated: false,
        });
    }

    if dry_run {
        info!(
            "dry-run: would commit {} addition(s) and {} deletion(s) to {}",
            diff.additions.len(),
            diff.deletions.len(),
            branch
        );
        return Ok(CommitOutcome {
            sha: expected_head.clone(),
            updated: true,
        });
    }

    let request = CommitRequest {
        branch: branch.clone(),
        expected_head: expected_head.clone(),
        message,
        additions: diff.additions,
        deletions: diff.deletions,
    };
    let sha = forge.create_commit(request).await?;
    info!("committed {} to {}", sha, branch);

    Ok(CommitOutcome { sha, updated: true })
}

//! engine::branch
//!
//! Make sure the target branch exists before committing to it.

use tracing::info;

use super::{resolve::require_commitish, ReconcileError};
use crate::core::types::{BranchName, Oid};
use crate::forge::Forge;

/// The target branch after [`ensure_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchState {
    pub name: BranchName,
    /// Current head, or the commit it will be created at in dry-run.
    pub head: Oid,
    /// True if the branch did not exist before this run.
    pub is_new: bool,
}

/// Look up `branch`, creating it at `base` when absent and `create` is set.
///
/// `base` is a commit-ish resolved on demand only when creation is needed.
/// With `dry_run` the resolution still happens but no ref is written.
pub async fn ensure_branch(
    forge: &dyn Forge,
    branch: &BranchName,
    base: &str,
    create: bool,
    dry_run: bool,
) -> Result<BranchState, ReconcileError> {
    let ref_name = branch.as_ref_name();

    if let Some(existing) = forge.get_ref(&ref_name).await? {
        return Ok(BranchState {
            name: branch.clone(),
            head: existing.oid,
            is_new: false,
        });
    }

    if !create {
        return Err(ReconcileError::NotFound(format!(
            "branch {:?} does not exist",
            branch.as_str()
        )));
    }

    let head = require_commitish(forge, base).await?;
    if dry_run {
        info!("dry-run: would create {} at {}", ref_name, head);
    } else {
        info!("creating {} at {}", ref_name, head);
        forge.create_ref(&ref_name, &head).await?;
    }

    Ok(BranchState {
        name: branch.clone(),
        head,
        is_new: true,
    })
}

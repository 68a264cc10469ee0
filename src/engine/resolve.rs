//! engine::resolve
//!
//! Commit-ish resolution.
//!
//! A literal hash (7 to 40 lowercase hex characters) goes through a direct
//! commit lookup, which validates existence and expands it to full length.
//! Anything else is a symbolic expression (branch, tag, `main~1`) resolved
//! by the remote. Absence is `Ok(None)`, never an error.

use serde::Serialize;
use tracing::debug;

use super::ReconcileError;
use crate::core::types::{is_commit_hash, Oid, RefType};
use crate::forge::{Forge, ForgeError};

/// Resolve `commitish` to a full commit id.
pub async fn resolve_commitish(
    forge: &dyn Forge,
    commitish: &str,
) -> Result<Option<Oid>, ForgeError> {
    let resolved = if is_commit_hash(commitish) {
        forge.commit_sha(commitish).await?
    } else {
        forge.resolve_expression(commitish).await?
    };

    match &resolved {
        Some(oid) => debug!("resolved {} to {}", commitish, oid),
        None => debug!("{} does not resolve", commitish),
    }
    Ok(resolved)
}

/// Resolve `commitish`, treating absence as [`ReconcileError::NotFound`].
pub async fn require_commitish(forge: &dyn Forge, commitish: &str) -> Result<Oid, ReconcileError> {
    resolve_commitish(forge, commitish)
        .await?
        .ok_or_else(|| ReconcileError::NotFound(format!("commitish {commitish:?} does not exist")))
}

/// Short names of every `ref_type` ref whose peeled commit is `sha`.
pub async fn matching_refs(
    forge: &dyn Forge,
    ref_type: RefType,
    sha: &Oid,
) -> Result<Vec<String>, ForgeError> {
    let refs = forge.list_refs(ref_type).await?;
    Ok(refs
        .into_iter()
        .filter(|r| &r.commit == sha)
        .filter_map(|r| r.name.strip_prefix(ref_type.prefix()).map(str::to_string))
        .collect())
}

/// Inputs of the resolve command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub commitish: String,
    /// List matching branches.
    pub branches: bool,
    /// List matching tags.
    pub tags: bool,
}

/// Outcome of the resolve command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    pub repository: String,
    pub commitish: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveReport {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

async fn run(
    forge: &dyn Forge,
    opts: &ResolveOptions,
    report: &mut ResolveReport,
) -> Result<(), ReconcileError> {
    let sha = resolve_commitish(forge, &opts.commitish)
        .await?
        .ok_or_else(|| ReconcileError::NotFound("commitish does not exist".into()))?;
    report.sha = Some(sha.clone());

    if opts.branches {
        report.branches = Some(matching_refs(forge, RefType::Heads, &sha).await?);
    }
    if opts.tags {
        report.tags = Some(matching_refs(forge, RefType::Tags, &sha).await?);
    }
    Ok(())
}

/// Run the resolve command, capturing any failure in the report.
pub async fn reconcile_resolve(forge: &dyn Forge, opts: &ResolveOptions) -> ResolveReport {
    let mut report = ResolveReport {
        repository: forge.repository().to_string(),
        commitish: opts.commitish.clone(),
        ..Default::default()
    };
    if let Err(e) = run(forge, opts, &mut report).await {
        report.error = Some(e.to_string());
    }
    report
}

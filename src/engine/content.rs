//! engine::content
//!
//! The content command: commit a set of file changes to a branch, creating
//! the branch and a pull request as needed.
//!
//! # Flow
//!
//! ```text
//! parse specs -> repository info -> base oid -> ensure branch
//!   -> assemble changes -> diff -> commit
//!   -> (new branch, nothing committed) delete branch
//!   -> (pr title, branch ahead of base) ensure pull request
//! ```
//!
//! File-spec problems are collected and reported together before any
//! remote call.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::branch::ensure_branch;
use super::commit::apply_commit;
use super::diff::{compute_diff, ChangeSet};
use super::pull_request::{ensure_pull_request, AutoMergeMode, PullRequestSpec, PullRequestState};
use super::resolve::require_commitish;
use super::ReconcileError;
use crate::core::filespec::{clean_path, parse_copy_spec, parse_update_spec, CopySpec, SpecError};
use crate::core::message::CommitMessage;
use crate::core::types::{BranchName, Oid};
use crate::forge::Forge;

/// Pull-request settings for the content command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestOptions {
    pub title: String,
    pub body: Option<String>,
    pub draft: bool,
    pub auto_merge: AutoMergeMode,
}

/// Inputs of the content command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOptions {
    /// Target branch.
    pub branch: BranchName,
    /// Base branch; defaults to the repository's default branch.
    pub base_branch: Option<String>,
    pub create_branch: bool,
    /// Changes derived from the local working tree.
    pub local: ChangeSet,
    /// `[branch<sep>]src<sep>dst` specs.
    pub copies: Vec<String>,
    /// `local[<sep>remote]` specs.
    pub updates: Vec<String>,
    /// Remote paths to delete.
    pub deletes: Vec<String>,
    pub separator: String,
    pub message: CommitMessage,
    pub pull_request: Option<PullRequestOptions>,
    pub force: bool,
    pub allow_empty: bool,
    pub dry_run: bool,
}

/// Outcome of the content command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentReport {
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Oid>,
    pub updated: bool,
    #[serde(rename = "pullrequest", skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentReport {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// File specs after local validation.
#[derive(Debug, Default)]
struct ParsedSpecs {
    copies: Vec<CopySpec>,
    /// Remote path and the local file's bytes.
    updates: Vec<(String, Vec<u8>)>,
    deletes: Vec<String>,
}

/// Parse every spec and read update sources, reporting all problems at once.
fn parse_specs(opts: &ContentOptions) -> Result<ParsedSpecs, ReconcileError> {
    if opts.separator.is_empty() {
        return Err(SpecError::EmptySeparator.into());
    }

    let mut parsed = ParsedSpecs::default();
    let mut problems = Vec::new();

    for spec in &opts.copies {
        match parse_copy_spec(spec, &opts.separator) {
            Ok(copy) => parsed.copies.push(copy),
            Err(e) => problems.push(e.to_string()),
        }
    }

    for spec in &opts.updates {
        match parse_update_spec(spec, &opts.separator) {
            Ok(update) => match std::fs::read(&update.source) {
                Ok(content) => parsed.updates.push((update.target, content)),
                Err(e) => problems.push(format!("reading {}: {}", update.source, e)),
            },
            Err(e) => problems.push(e.to_string()),
        }
    }

    parsed.deletes = opts.deletes.iter().map(|p| clean_path(p)).collect();

    if !problems.is_empty() {
        return Err(ReconcileError::Validation(format!(
            "parsing content specs: {}",
            problems.join("; ")
        )));
    }
    Ok(parsed)
}

/// Build the desired change set in precedence order: local, copies, updates, deletes.
async fn assemble_changes(
    forge: &dyn Forge,
    local: &ChangeSet,
    specs: ParsedSpecs,
    base_branch: &str,
) -> Result<ChangeSet, ReconcileError> {
    let mut changes = local.clone();

    for copy in specs.copies {
        let branch = copy
            .branch
            .as_ref()
            .map(BranchName::as_str)
            .unwrap_or(base_branch);
        match forge.file_text(branch, &copy.source).await? {
            Some(text) => {
                debug!("copying {}:{} to {}", branch, copy.source, copy.target);
                changes.upsert(copy.target, text);
            }
            None => warn!("{}:{} not found; skipping copy", branch, copy.source),
        }
    }

    for (target, content) in specs.updates {
        changes.upsert(target, content);
    }

    for path in specs.deletes {
        changes.delete(path);
    }

    Ok(changes)
}

async fn run(
    forge: &dyn Forge,
    opts: &ContentOptions,
    report: &mut ContentReport,
) -> Result<(), ReconcileError> {
    let specs = parse_specs(opts)?;

    let info = forge.repository_info().await?;
    if info.is_empty {
        return Err(ReconcileError::EmptyRepository);
    }

    let base_branch = opts
        .base_branch
        .clone()
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| info.default_branch.clone());
    let base_oid = match &info.default_branch_oid {
        Some(oid) if base_branch == info.default_branch => oid.clone(),
        _ => require_commitish(forge, &base_branch).await?,
    };
    debug!("base {} at {}", base_branch, base_oid);

    let state = ensure_branch(
        forge,
        &opts.branch,
        base_oid.as_str(),
        opts.create_branch,
        opts.dry_run,
    )
    .await?;

    let changes = assemble_changes(forge, &opts.local, specs, &base_branch).await?;

    // A branch that was only pretended into existence has the base's content.
    let diff_branch = if state.is_new && opts.dry_run {
        base_branch.as_str()
    } else {
        opts.branch.as_str()
    };
    let diff = compute_diff(forge, &changes, diff_branch, opts.force).await?;

    let outcome = apply_commit(
        forge,
        &opts.branch,
        &state.head,
        diff,
        opts.message.clone(),
        opts.allow_empty,
        opts.dry_run,
    )
    .await?;
    report.sha = Some(outcome.sha.clone());
    report.updated = outcome.updated;

    if !outcome.updated && state.is_new {
        if !opts.dry_run {
            info!("no changes; deleting new branch {}", opts.branch);
            forge.delete_ref(&opts.branch.as_ref_name()).await?;
        }
        return Ok(());
    }

    let Some(pr) = opts.pull_request.as_ref().filter(|pr| !pr.title.is_empty()) else {
        return Ok(());
    };
    if !outcome.updated && outcome.sha == base_oid {
        debug!("{} matches {}; no pull request needed", opts.branch, base_branch);
        return Ok(());
    }

    let spec = PullRequestSpec {
        head: opts.branch.to_string(),
        base: base_branch,
        title: pr.title.clone(),
        body: pr.body.clone().filter(|b| !b.is_empty()),
        draft: pr.draft,
        auto_merge: pr.auto_merge,
    };
    report.pull_request =
        Some(ensure_pull_request(forge, &spec, &info.merge, state.is_new, opts.dry_run).await?);

    Ok(())
}

/// Run the content command, capturing any failure in the report.
pub async fn reconcile_content(forge: &dyn Forge, opts: &ContentOptions) -> ContentReport {
    let mut report = ContentReport {
        repository: forge.repository().to_string(),
        ..Default::default()
    };

    if let Err(e) = run(forge, opts, &mut report).await {
        report.error = Some(e.to_string());
    }
    report
}

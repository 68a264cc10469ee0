//! content command - Commit file changes to a branch via the API

use anyhow::{Context as _, Result};

use super::{block_on, Context};
use crate::cli::args::ContentArgs;
use crate::core::message::CommitMessage;
use crate::engine::{reconcile_content, ChangeSet, ContentOptions};

/// Commit the requested changes and print the content report.
pub fn content(ctx: &Context, args: &ContentArgs) -> Result<()> {
    let target = ctx.target(Some(args.branch.branch.as_deref()))?;
    let branch = target.branch.clone().context("branch is required")?;

    let local = if args.tracked || args.staged {
        let git = ctx
            .git
            .as_ref()
            .context("--tracked and --staged require a local repository")?;
        if args.staged {
            git.staged().context("calculating staged changes")?
        } else {
            git.tracked().context("calculating tracked changes")?
        }
    } else {
        ChangeSet::new()
    };

    let mut updates = args.update.clone();
    updates.extend(args.files.iter().cloned());

    let opts = ContentOptions {
        branch,
        base_branch: args.base_branch.clone(),
        create_branch: args.create_branch,
        local,
        copies: args.copy.clone(),
        updates,
        deletes: args.delete.clone(),
        separator: args.separator.clone(),
        message: CommitMessage::from(&ctx.message_spec(&args.message)),
        pull_request: ctx.pull_request(&args.pull_request)?,
        force: args.force,
        allow_empty: args.allow_empty,
        dry_run: args.dry_run,
    };

    let forge = ctx.forge(&target);
    let report = block_on(reconcile_content(&forge, &opts))?;
    ctx.emit(&report, report.error())
}

//! tag command - Create or update a tag

use anyhow::Result;

use super::{block_on, Context};
use crate::cli::args::TagArgs;
use crate::engine::{reconcile_tag, TagOptions};

/// Tag a commit-ish, defaulting to the target branch.
///
/// The branch is only required when no commit-ish is given.
pub fn tag(ctx: &Context, args: &TagArgs) -> Result<()> {
    let branch_flag = args
        .commitish
        .is_none()
        .then_some(args.branch.branch.as_deref());
    let target = ctx.target(branch_flag)?;

    let commitish = match (&args.commitish, &target.branch) {
        (Some(commitish), _) => commitish.clone(),
        (None, Some(branch)) => branch.to_string(),
        (None, None) => String::new(),
    };

    let opts = TagOptions {
        tag: args.tag.clone(),
        commitish,
        message: ctx.message_spec(&args.message).build(),
        lightweight: args.lightweight,
        force: args.force,
        dry_run: args.dry_run,
    };

    let forge = ctx.forge(&target);
    let report = block_on(reconcile_tag(&forge, &opts))?;
    ctx.emit(&report, report.error())
}

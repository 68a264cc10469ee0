//! update-ref command - Point refs at a source ref or commit

use anyhow::Result;

use super::{block_on, Context};
use crate::cli::args::UpdateRefArgs;
use crate::engine::{reconcile_refs, RefUpdate, RefUpdateOptions};

/// Update every target and print one report covering all of them.
///
/// Immutable targets that were skipped do not fail the command.
pub fn update_ref(ctx: &Context, args: &UpdateRefArgs) -> Result<()> {
    let target = ctx.target(None)?;

    let targets = if args.targets.is_empty() {
        ctx.env_targets()
    } else {
        args.targets.clone()
    };

    let opts = RefUpdateOptions {
        source: args.source.clone().unwrap_or_default(),
        source_type: args.source_type,
        targets,
        target_type: args.target_type,
        policy: RefUpdate {
            force: args.force,
            immutable: args.immutable,
            dry_run: args.dry_run,
        },
    };

    let forge = ctx.forge(&target);
    let report = block_on(reconcile_refs(&forge, &opts))?;
    ctx.emit(&report, report.error())
}

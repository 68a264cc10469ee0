//! resolve command - Resolve a commit-ish to a SHA

use anyhow::Result;

use super::{block_on, Context};
use crate::engine::{reconcile_resolve, ResolveOptions};

pub fn resolve(ctx: &Context, commitish: &str, branches: bool, tags: bool) -> Result<()> {
    let target = ctx.target(None)?;
    let opts = ResolveOptions {
        commitish: commitish.to_string(),
        branches,
        tags,
    };

    let forge = ctx.forge(&target);
    let report = block_on(reconcile_resolve(&forge, &opts))?;
    ctx.emit(&report, report.error())
}

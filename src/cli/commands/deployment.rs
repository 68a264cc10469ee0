//! deployment command - Update the deployment status of an environment

use anyhow::Result;

use super::{block_on, Context};
use crate::cli::args::DeploymentArgs;
use crate::engine::{reconcile_deployment, DeploymentOptions};

pub fn deployment(ctx: &Context, args: &DeploymentArgs) -> Result<()> {
    let target = ctx.target(None)?;

    let opts = DeploymentOptions {
        environment: args
            .positional_environment
            .clone()
            .or_else(|| args.environment.clone())
            .unwrap_or_default(),
        commitish: args.commitish.clone().unwrap_or_default(),
        state: args.state,
        description: args.description.clone(),
        environment_url: args.environment_url.clone(),
        transient: args.transient,
        production: args.production,
        dry_run: args.dry_run,
    };

    let forge = ctx.forge(&target);
    let report = block_on(reconcile_deployment(&forge, &opts))?;
    ctx.emit(&report, report.error())
}

//! engine::deployment
//!
//! Record a deployment status for an environment.
//!
//! The first existing deployment of the commit to the environment is
//! reused; one is created only when none exists. Each run adds one status.

use serde::Serialize;
use tracing::info;

use super::{resolve::require_commitish, ReconcileError};
use crate::core::types::Oid;
use crate::forge::{DeploymentRequest, DeploymentState, DeploymentStatusRequest, Forge};

/// Inputs of the deployment command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOptions {
    pub environment: String,
    /// Commit-ish to deploy; empty means the default branch.
    pub commitish: String,
    pub state: DeploymentState,
    pub description: Option<String>,
    pub environment_url: Option<String>,
    pub transient: bool,
    pub production: bool,
    pub dry_run: bool,
}

/// Outcome of the deployment command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    pub deployment_id: u64,
    pub status_id: u64,
    pub environment: String,
    pub commitish: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Oid>,
    pub state: DeploymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// True if the deployment was created by this run.
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentReport {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

async fn run(
    forge: &dyn Forge,
    opts: &DeploymentOptions,
    report: &mut DeploymentReport,
) -> Result<(), ReconcileError> {
    if opts.environment.is_empty() {
        return Err(ReconcileError::Validation("environment is required".into()));
    }

    let sha = if opts.commitish.is_empty() {
        let info = forge.repository_info().await?;
        report.commitish = info.default_branch;
        info.default_branch_oid.ok_or(ReconcileError::EmptyRepository)?
    } else {
        require_commitish(forge, &opts.commitish).await?
    };
    report.sha = Some(sha.clone());
    report.url = Some(forge.commit_url(&sha));

    if opts.dry_run {
        info!(
            "dry-run: skipping deployment of {} to {} with state {}",
            report.commitish, opts.environment, opts.state
        );
        return Ok(());
    }

    let existing = forge.list_deployments(&sha, &opts.environment).await?;
    let deployment = match existing.into_iter().next() {
        Some(deployment) => {
            info!("using existing deployment {}", deployment.id);
            deployment
        }
        None => {
            info!("creating deployment of {} to {}", sha, opts.environment);
            let deployment = forge
                .create_deployment(DeploymentRequest {
                    sha: sha.clone(),
                    environment: opts.environment.clone(),
                    description: opts.description.clone(),
                    transient: opts.transient,
                    production: opts.production,
                })
                .await?;
            report.created = true;
            deployment
        }
    };
    report.deployment_id = deployment.id;

    let status = forge
        .create_deployment_status(
            deployment.id,
            DeploymentStatusRequest {
                state: opts.state,
                description: opts.description.clone(),
                environment_url: opts.environment_url.clone(),
            },
        )
        .await?;
    info!("created deployment status {} ({})", status.id, status.state);
    report.status_id = status.id;

    Ok(())
}

/// Run the deployment command, capturing any failure in the report.
pub async fn reconcile_deployment(forge: &dyn Forge, opts: &DeploymentOptions) -> DeploymentReport {
    let mut report = DeploymentReport {
        environment: opts.environment.clone(),
        commitish: opts.commitish.clone(),
        state: opts.state,
        ..Default::default()
    };

    if let Err(e) = run(forge, opts, &mut report).await {
        report.error = Some(e.to_string());
    }
    report
}

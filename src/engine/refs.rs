//! engine::refs
//!
//! Point arbitrary refs at a source commit.
//!
//! # Policies
//!
//! - `force` permits non-fast-forward moves
//! - `immutable` refuses to move a ref that already points elsewhere; the
//!   divergence is reported as a skip, not a failure
//!
//! The two are mutually exclusive and rejected before any remote call.
//! Creating a missing ref is always allowed since it cannot diverge.
//!
//! # Example
//!
//! ```ignore
//! let policy = RefUpdate { immutable: true, ..Default::default() };
//! let reports = update_refs(&forge, &sha, &targets, policy).await?;
//! for target in &reports {
//!     println!("{} updated={}", target.ref_name, target.updated);
//! }
//! ```

use serde::Serialize;
use tracing::{info, warn};

use super::ReconcileError;
use crate::core::types::{is_commit_hash, Oid, RefName, RefType};
use crate::forge::Forge;

/// Update policy for [`update_ref`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefUpdate {
    pub force: bool,
    pub immutable: bool,
    pub dry_run: bool,
}

impl RefUpdate {
    fn validate(&self) -> Result<(), ReconcileError> {
        if self.force && self.immutable {
            return Err(ReconcileError::Validation(
                "force and immutable are mutually exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// What [`update_ref`] did to one ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefMutation {
    pub name: RefName,
    /// Previous target; `None` if the ref was created.
    pub old: Option<Oid>,
    pub new: Oid,
    /// False when the ref already pointed at `new`.
    pub updated: bool,
}

/// Point `name` at `desired` under `policy`.
///
/// # Errors
///
/// - `Validation` if both force and immutable are set
/// - `Diverged` if the ref is immutable and points elsewhere (nothing written)
pub async fn update_ref(
    forge: &dyn Forge,
    name: &RefName,
    desired: &Oid,
    policy: RefUpdate,
) -> Result<RefMutation, ReconcileError> {
    policy.validate()?;

    let Some(current) = forge.get_ref(name).await? else {
        if policy.dry_run {
            info!("dry-run: would create {} at {}", name, desired);
        } else {
            info!("creating {} at {}", name, desired);
            forge.create_ref(name, desired).await?;
        }
        return Ok(RefMutation {
            name: name.clone(),
            old: None,
            new: desired.clone(),
            updated: true,
        });
    };

    if &current.oid == desired {
        info!("{} already at {}", name, desired);
        return Ok(RefMutation {
            name: name.clone(),
            old: Some(current.oid),
            new: desired.clone(),
            updated: false,
        });
    }

    if policy.immutable {
        return Err(ReconcileError::Diverged {
            name: name.clone(),
            current: current.oid,
            desired: desired.clone(),
        });
    }

    if policy.dry_run {
        info!("dry-run: would move {} from {} to {}", name, current.oid, desired);
    } else {
        info!("moving {} from {} to {}", name, current.oid, desired);
        forge.update_ref(name, desired, policy.force).await?;
    }

    Ok(RefMutation {
        name: name.clone(),
        old: Some(current.oid),
        new: desired.clone(),
        updated: true,
    })
}

/// Report entry for one target ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_sha: Option<Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Oid>,
    /// Set when an immutable ref diverged and was left alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetReport {
    fn new(name: &RefName) -> Self {
        Self {
            ref_name: name.to_string(),
            updated: false,
            old_sha: None,
            sha: None,
            skipped: None,
            error: None,
        }
    }
}

/// Point every target at `source`, collecting one report per target.
///
/// A failing target does not stop the remaining ones. Only an invalid
/// policy fails the whole batch.
pub async fn update_refs(
    forge: &dyn Forge,
    source: &Oid,
    targets: &[RefName],
    policy: RefUpdate,
) -> Result<Vec<TargetReport>, ReconcileError> {
    policy.validate()?;

    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        let mut report = TargetReport::new(target);
        match update_ref(forge, target, source, policy).await {
            Ok(mutation) => {
                report.updated = mutation.updated;
                report.sha = Some(mutation.new);
                if mutation.updated {
                    report.old_sha = mutation.old;
                }
            }
            Err(ReconcileError::Diverged {
                current, desired, ..
            }) => {
                warn!("{} is immutable and points to {}; skipping", target, current);
                report.skipped = Some(format!("immutable ref points to {current}"));
                report.old_sha = Some(current);
                report.sha = Some(desired);
            }
            Err(e) => report.error = Some(e.to_string()),
        }
        reports.push(report);
    }
    Ok(reports)
}

/// Inputs of the update-ref command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefUpdateOptions {
    /// A commit hash, or a ref name qualified with `source_type`.
    pub source: String,
    pub source_type: RefType,
    pub targets: Vec<String>,
    pub target_type: RefType,
    pub policy: RefUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Oid>,
}

/// Outcome of the update-ref command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefUpdateReport {
    pub source: SourceReport,
    pub target: Vec<TargetReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefUpdateReport {
    /// The command-level error, else the first per-target error.
    ///
    /// Skipped targets are not errors.
    pub fn error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.target.iter().find_map(|t| t.error.as_deref()))
    }
}

async fn resolve_source(
    forge: &dyn Forge,
    opts: &RefUpdateOptions,
    report: &mut SourceReport,
) -> Result<Oid, ReconcileError> {
    if opts.source.is_empty() {
        return Err(ReconcileError::Validation("no source ref specified".into()));
    }

    if is_commit_hash(&opts.source) {
        report.ref_name = opts.source.clone();
        return forge.commit_sha(&opts.source).await?.ok_or_else(|| {
            ReconcileError::NotFound(format!("commit {:?} does not exist", opts.source))
        });
    }

    let name = RefName::qualify(&opts.source, opts.source_type)?;
    report.ref_name = name.to_string();
    forge
        .get_ref(&name)
        .await?
        .map(|r| r.oid)
        .ok_or_else(|| ReconcileError::NotFound(format!("source ref {name} does not exist")))
}

/// Resolve the source, qualify the targets and update them all.
pub async fn reconcile_refs(forge: &dyn Forge, opts: &RefUpdateOptions) -> RefUpdateReport {
    let mut report = RefUpdateReport {
        source: SourceReport {
            ref_name: opts.source.clone(),
            sha: None,
        },
        ..Default::default()
    };

    let result = async {
        opts.policy.validate()?;
        if opts.targets.is_empty() {
            return Err(ReconcileError::Validation("no target refs specified".into()));
        }
        let targets = opts
            .targets
            .iter()
            .map(|t| RefName::qualify(t, opts.target_type))
            .collect::<Result<Vec<_>, _>>()?;

        let source = resolve_source(forge, opts, &mut report.source).await?;
        report.source.sha = Some(source.clone());

        update_refs(forge, &source, &targets, opts.policy).await
    }
    .await;

    match result {
        Ok(targets) => report.target = targets,
        Err(e) => report.error = Some(e.to_string()),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{MockForge, MockOperation, Op};
    use crate::forge::ForgeError;

    fn tag(name: &str) -> RefName {
        RefName::for_tag(name).unwrap()
    }

    /// Forge with `main` at child `d` whose parent is `p`.
    fn parent_child() -> (MockForge, Oid, Oid) {
        let forge = MockForge::new();
        let p = forge.commit_files("main", &[("f", "parent")]);
        let d = forge.commit_files("main", &[("f", "child")]);
        (forge, p, d)
    }

    mod single {
        use super::*;

        #[tokio::test]
        async fn creates_missing_ref() {
            let (forge, _, d) = parent_child();
            let mutation = update_ref(&forge, &tag("v1"), &d, RefUpdate::default())
                .await
                .unwrap();
            assert!(mutation.updated);
            assert_eq!(mutation.old, None);
            assert_eq!(forge.ref_target("refs/tags/v1"), Some(d));
        }

        #[tokio::test]
        async fn creates_missing_ref_even_when_immutable() {
            let (forge, _, d) = parent_child();
            let policy = RefUpdate {
                immutable: true,
                ..Default::default()
            };
            let mutation = update_ref(&forge, &tag("v1"), &d, policy).await.unwrap();
            assert!(mutation.updated);
        }

        #[tokio::test]
        async fn same_sha_is_noop_even_with_force() {
            let (forge, _, d) = parent_child();
            forge.set_ref("refs/tags/v1", &d);

            let policy = RefUpdate {
                force: true,
                ..Default::default()
            };
            let mutation = update_ref(&forge, &tag("v1"), &d, policy).await.unwrap();
            assert!(!mutation.updated);
            assert!(forge.mutations().is_empty());
        }

        #[tokio::test]
        async fn fast_forward_update() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/v1", &p);

            let mutation = update_ref(&forge, &tag("v1"), &d, RefUpdate::default())
                .await
                .unwrap();
            assert!(mutation.updated);
            assert_eq!(mutation.old, Some(p));
            assert_eq!(forge.ref_target("refs/tags/v1"), Some(d));
        }

        #[tokio::test]
        async fn backwards_move_needs_force() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/v1", &d);

            let err = update_ref(&forge, &tag("v1"), &p, RefUpdate::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ReconcileError::Forge(ForgeError::ApiError { status: 422, .. })));

            let policy = RefUpdate {
                force: true,
                ..Default::default()
            };
            update_ref(&forge, &tag("v1"), &p, policy).await.unwrap();
            assert_eq!(forge.ref_target("refs/tags/v1"), Some(p));
        }

        #[tokio::test]
        async fn immutable_divergence_is_skipped() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/v1", &p);

            let policy = RefUpdate {
                immutable: true,
                ..Default::default()
            };
            let err = update_ref(&forge, &tag("v1"), &d, policy).await.unwrap_err();
            assert_eq!(
                err,
                ReconcileError::Diverged {
                    name: tag("v1"),
                    current: p.clone(),
                    desired: d
                }
            );
            assert!(err.is_policy_skip());
            assert!(forge.mutations().is_empty());
            assert_eq!(forge.ref_target("refs/tags/v1"), Some(p));
        }

        #[tokio::test]
        async fn force_and_immutable_rejected_before_remote_calls() {
            let forge = MockForge::new().fail_on(Op::GetRef, ForgeError::RateLimited);
            let d = forge.head("main").unwrap();
            let policy = RefUpdate {
                force: true,
                immutable: true,
                dry_run: false,
            };
            let err = update_ref(&forge, &tag("v1"), &d, policy).await.unwrap_err();
            assert!(matches!(err, ReconcileError::Validation(_)));
            assert!(forge.operations().is_empty());
        }
    }

    mod batch {
        use super::*;

        #[tokio::test]
        async fn one_failure_does_not_abort_others() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/behind", &d);

            let targets = vec![tag("behind"), tag("fresh")];
            let reports = update_refs(&forge, &p, &targets, RefUpdate::default())
                .await
                .unwrap();

            assert_eq!(reports.len(), 2);
            assert!(reports[0].error.is_some());
            assert!(!reports[0].updated);
            assert!(reports[1].updated);
            assert_eq!(reports[1].sha, Some(p));
        }

        #[tokio::test]
        async fn skipped_target_carries_both_shas() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/v1", &p);

            let policy = RefUpdate {
                immutable: true,
                ..Default::default()
            };
            let reports = update_refs(&forge, &d, &[tag("v1")], policy).await.unwrap();
            let report = &reports[0];
            assert!(!report.updated);
            assert_eq!(report.old_sha, Some(p));
            assert_eq!(report.sha, Some(d));
            assert!(report.skipped.is_some());
            assert!(report.error.is_none());
        }

        #[tokio::test]
        async fn unchanged_target_omits_old_sha() {
            let (forge, _, d) = parent_child();
            forge.set_ref("refs/tags/v1", &d);

            let reports = update_refs(&forge, &d, &[tag("v1")], RefUpdate::default())
                .await
                .unwrap();
            assert_eq!(reports[0].old_sha, None);
            assert_eq!(reports[0].sha, Some(d));
            assert!(!reports[0].updated);
        }
    }

    mod command {
        use super::*;

        fn options(source: &str, targets: &[&str]) -> RefUpdateOptions {
            RefUpdateOptions {
                source: source.into(),
                source_type: RefType::Heads,
                targets: targets.iter().map(|t| t.to_string()).collect(),
                target_type: RefType::Tags,
                policy: RefUpdate::default(),
            }
        }

        #[tokio::test]
        async fn source_branch_to_tags() {
            let (forge, _, d) = parent_child();
            let report = reconcile_refs(&forge, &options("main", &["v1", "heads/release"])).await;

            assert_eq!(report.error(), None);
            assert_eq!(report.source.ref_name, "refs/heads/main");
            assert_eq!(report.source.sha, Some(d.clone()));
            assert_eq!(report.target[0].ref_name, "refs/tags/v1");
            assert_eq!(report.target[1].ref_name, "refs/heads/release");
            assert_eq!(forge.ref_target("refs/heads/release"), Some(d));
        }

        #[tokio::test]
        async fn source_commit_hash() {
            let (forge, p, _) = parent_child();
            let report = reconcile_refs(&forge, &options(p.short(10), &["v1"])).await;
            assert_eq!(report.source.sha, Some(p.clone()));
            assert_eq!(forge.ref_target("refs/tags/v1"), Some(p));
        }

        #[tokio::test]
        async fn missing_source_is_error() {
            let forge = MockForge::new();
            let report = reconcile_refs(&forge, &options("nope", &["v1"])).await;
            assert!(report.error().unwrap().contains("does not exist"));
            assert!(forge.mutations().is_empty());
        }

        #[tokio::test]
        async fn no_targets_is_error() {
            let forge = MockForge::new();
            let report = reconcile_refs(&forge, &options("main", &[])).await;
            assert_eq!(report.error(), Some("no target refs specified"));
        }

        #[tokio::test]
        async fn invalid_target_fails_before_remote_calls() {
            let forge = MockForge::new();
            let report = reconcile_refs(&forge, &options("main", &["ok", "bad..ref"])).await;
            assert!(report.error().is_some());
            assert!(report.target.is_empty());
            assert!(forge.operations().is_empty());
        }

        #[tokio::test]
        async fn per_target_error_surfaces() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/v1", &d);
            let report = reconcile_refs(&forge, &options(p.as_str(), &["v1"])).await;
            assert!(report.error.is_none());
            assert!(report.error().is_some());
        }

        #[tokio::test]
        async fn immutable_skip_is_not_an_error() {
            let (forge, p, d) = parent_child();
            forge.set_ref("refs/tags/v1", &p);
            let mut opts = options(d.as_str(), &["v1"]);
            opts.policy.immutable = true;

            let report = reconcile_refs(&forge, &opts).await;
            assert_eq!(report.error(), None);
            assert!(report.target[0].skipped.is_some());
            assert!(!forge
                .mutations()
                .iter()
                .any(|op| matches!(op, MockOperation::UpdateRef { .. })));
        }
    }
}

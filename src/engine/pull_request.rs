//! engine::pull_request
//!
//! Find-or-create a pull request and negotiate auto-merge.
//!
//! Auto-merge is best effort: an unsupported setting downgrades to `off`
//! with a warning, and a failure to enable it on a new pull request is
//! logged without failing the run. An existing pull request is returned as
//! is; auto-merge is never re-applied to it.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::ReconcileError;
use crate::forge::{CreatePrRequest, Forge, MergeCapabilities, MergeMethod};

/// Requested auto-merge behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AutoMergeMode {
    #[default]
    Off,
    Merge,
    Squash,
    Rebase,
}

impl AutoMergeMode {
    pub fn method(self) -> Option<MergeMethod> {
        match self {
            AutoMergeMode::Off => None,
            AutoMergeMode::Merge => Some(MergeMethod::Merge),
            AutoMergeMode::Squash => Some(MergeMethod::Squash),
            AutoMergeMode::Rebase => Some(MergeMethod::Rebase),
        }
    }
}

impl std::str::FromStr for AutoMergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" | "" => Ok(AutoMergeMode::Off),
            "merge" => Ok(AutoMergeMode::Merge),
            "squash" => Ok(AutoMergeMode::Squash),
            "rebase" => Ok(AutoMergeMode::Rebase),
            other => Err(format!(
                "invalid auto-merge mode {other:?}: expected off, merge, squash or rebase"
            )),
        }
    }
}

/// Downgrade `requested` to what the repository permits.
pub fn negotiate_auto_merge(requested: AutoMergeMode, caps: &MergeCapabilities) -> AutoMergeMode {
    let Some(method) = requested.method() else {
        return AutoMergeMode::Off;
    };

    if !caps.auto_merge_allowed {
        warn!("repository does not have auto-merge enabled; using 'off'");
        return AutoMergeMode::Off;
    }

    if !caps.allows(method) {
        let supported: Vec<String> = caps.supported().iter().map(ToString::to_string).collect();
        warn!(
            "repository does not support auto-merge method {:?}; supported methods: [{}]; using 'off'",
            method.to_string(),
            supported.join(", ")
        );
        return AutoMergeMode::Off;
    }

    requested
}

/// The pull request to ensure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestSpec {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: Option<String>,
    pub draft: bool,
    pub auto_merge: AutoMergeMode,
}

/// The pull request after [`ensure_pull_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestState {
    pub head: String,
    pub base: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub draft: bool,
    /// Auto-merge mode enabled by this run.
    pub auto_merge: AutoMergeMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// True if the pull request was opened by this run.
    pub created: bool,
}

/// Return the open pull request from `spec.head` into `spec.base`, opening one if needed.
///
/// `head_is_new` skips the search: a branch created in this run cannot
/// carry an existing pull request. In dry-run nothing is created and the
/// returned state has no number or url.
pub async fn ensure_pull_request(
    forge: &dyn Forge,
    spec: &PullRequestSpec,
    caps: &MergeCapabilities,
    head_is_new: bool,
    dry_run: bool,
) -> Result<PullRequestState, ReconcileError> {
    let auto_merge = negotiate_auto_merge(spec.auto_merge, caps);

    let mut state = PullRequestState {
        head: spec.head.clone(),
        base: spec.base.clone(),
        title: spec.title.clone(),
        body: spec.body.clone(),
        draft: spec.draft,
        ..Default::default()
    };

    if !head_is_new {
        if let Some(existing) = forge.find_pull_request(&spec.head, &spec.base).await? {
            debug!("found open pull request: {}", existing.url);
            state.title = existing.title;
            state.draft = existing.is_draft;
            state.number = Some(existing.number);
            state.url = Some(existing.url);
            return Ok(state);
        }
    }

    if dry_run {
        info!("dry-run: would open pull request from {} to {}", spec.head, spec.base);
        state.auto_merge = auto_merge;
        return Ok(state);
    }

    debug!("opening pull request from {:?} to {:?}", spec.head, spec.base);
    let pr = forge
        .create_pull_request(CreatePrRequest {
            head: spec.head.clone(),
            base: spec.base.clone(),
            title: spec.title.clone(),
            body: spec.body.clone(),
            draft: spec.draft,
        })
        .await?;
    info!("opened pull request #{}: {}", pr.number, pr.url);

    if let Some(method) = auto_merge.method() {
        match forge.enable_auto_merge(&pr, method).await {
            Ok(()) => state.auto_merge = auto_merge,
            Err(e) => warn!("failed to enable auto-merge on #{}: {}", pr.number, e),
        }
    }

    state.number = Some(pr.number);
    state.url = Some(pr.url);
    state.created = true;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{MockForge, MockOperation, Op};
    use crate::forge::ForgeError;

    fn all_allowed() -> MergeCapabilities {
        MergeCapabilities {
            auto_merge_allowed: true,
            merge_commit_allowed: true,
            squash_merge_allowed: true,
            rebase_merge_allowed: true,
        }
    }

    fn merge_only() -> MergeCapabilities {
        MergeCapabilities {
            squash_merge_allowed: false,
            rebase_merge_allowed: false,
            ..all_allowed()
        }
    }

    fn spec(auto_merge: AutoMergeMode) -> PullRequestSpec {
        PullRequestSpec {
            head: "feature".into(),
            base: "main".into(),
            title: "Add feature".into(),
            body: Some("details".into()),
            draft: false,
            auto_merge,
        }
    }

    mod negotiate {
        use super::*;

        #[test]
        fn off_stays_off() {
            assert_eq!(
                negotiate_auto_merge(AutoMergeMode::Off, &all_allowed()),
                AutoMergeMode::Off
            );
        }

        #[test]
        fn supported_method_kept() {
            assert_eq!(
                negotiate_auto_merge(AutoMergeMode::Squash, &all_allowed()),
                AutoMergeMode::Squash
            );
        }

        #[test]
        fn unsupported_method_downgrades() {
            assert_eq!(
                negotiate_auto_merge(AutoMergeMode::Squash, &merge_only()),
                AutoMergeMode::Off
            );
            assert_eq!(
                negotiate_auto_merge(AutoMergeMode::Merge, &merge_only()),
                AutoMergeMode::Merge
            );
        }

        #[test]
        fn disabled_auto_merge_downgrades() {
            let caps = MergeCapabilities {
                auto_merge_allowed: false,
                ..all_allowed()
            };
            assert_eq!(
                negotiate_auto_merge(AutoMergeMode::Merge, &caps),
                AutoMergeMode::Off
            );
        }

        #[test]
        fn parse_modes() {
            assert_eq!("squash".parse::<AutoMergeMode>(), Ok(AutoMergeMode::Squash));
            assert_eq!("".parse::<AutoMergeMode>(), Ok(AutoMergeMode::Off));
            assert!("fast".parse::<AutoMergeMode>().is_err());
        }
    }

    mod ensure {
        use super::*;

        #[tokio::test]
        async fn creates_and_enables_auto_merge() {
            let forge = MockForge::new();
            forge.commit_files("feature", &[("f", "x")]);

            let state = ensure_pull_request(
                &forge,
                &spec(AutoMergeMode::Squash),
                &all_allowed(),
                false,
                false,
            )
            .await
            .unwrap();

            assert!(state.created);
            assert_eq!(state.auto_merge, AutoMergeMode::Squash);
            let number = state.number.unwrap();
            assert_eq!(forge.auto_merge(number), Some(MergeMethod::Squash));
        }

        #[tokio::test]
        async fn unsupported_auto_merge_still_creates() {
            let forge = MockForge::new().with_merge_capabilities(merge_only());
            forge.commit_files("feature", &[("f", "x")]);

            let state = ensure_pull_request(
                &forge,
                &spec(AutoMergeMode::Squash),
                &merge_only(),
                true,
                false,
            )
            .await
            .unwrap();

            assert!(state.created);
            assert_eq!(state.auto_merge, AutoMergeMode::Off);
            assert!(!forge
                .operations()
                .iter()
                .any(|op| matches!(op, MockOperation::EnableAutoMerge { .. })));
        }

        #[tokio::test]
        async fn enable_failure_is_not_fatal() {
            let forge = MockForge::new().fail_on(
                Op::EnableAutoMerge,
                ForgeError::ApiError {
                    status: 422,
                    message: "nope".into(),
                },
            );
            forge.commit_files("feature", &[("f", "x")]);

            let state = ensure_pull_request(
                &forge,
                &spec(AutoMergeMode::Merge),
                &all_allowed(),
                true,
                false,
            )
            .await
            .unwrap();
            assert!(state.created);
            assert_eq!(state.auto_merge, AutoMergeMode::Off);
        }

        #[tokio::test]
        async fn existing_pull_request_is_reused() {
            let forge = MockForge::new();
            forge.commit_files("feature", &[("f", "x")]);
            let existing = forge.seed_pull_request("feature", "main", "Existing", false);

            let state = ensure_pull_request(
                &forge,
                &spec(AutoMergeMode::Merge),
                &all_allowed(),
                false,
                false,
            )
            .await
            .unwrap();

            assert!(!state.created);
            assert_eq!(state.number, Some(existing.number));
            assert_eq!(state.title, "Existing");
            assert_eq!(forge.auto_merge(existing.number), None);
            assert!(forge
                .mutations()
                .iter()
                .all(|op| !matches!(op, MockOperation::CreatePullRequest { .. })));
        }

        #[tokio::test]
        async fn cross_repository_pull_request_is_ignored() {
            let forge = MockForge::new();
            forge.commit_files("feature", &[("f", "x")]);
            forge.seed_pull_request("feature", "main", "From fork", true);

            let state = ensure_pull_request(
                &forge,
                &spec(AutoMergeMode::Off),
                &all_allowed(),
                false,
                false,
            )
            .await
            .unwrap();
            assert!(state.created);
            assert_eq!(forge.pull_requests().len(), 2);
        }

        #[tokio::test]
        async fn new_branch_skips_search() {
            let forge = MockForge::new();
            forge.commit_files("feature", &[("f", "x")]);

            ensure_pull_request(&forge, &spec(AutoMergeMode::Off), &all_allowed(), true, false)
                .await
                .unwrap();
            assert!(!forge
                .operations()
                .iter()
                .any(|op| matches!(op, MockOperation::FindPullRequest { .. })));
        }

        #[tokio::test]
        async fn dry_run_creates_nothing() {
            let forge = MockForge::new();
            forge.commit_files("feature", &[("f", "x")]);

            let state = ensure_pull_request(
                &forge,
                &spec(AutoMergeMode::Merge),
                &all_allowed(),
                false,
                true,
            )
            .await
            .unwrap();
            assert!(!state.created);
            assert_eq!(state.number, None);
            assert!(forge.mutations().is_empty());
        }
    }
}

//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves its settings through [`Context`]
//! 2. Builds the engine options and runs the reconciler
//! 3. Writes the report and fails if the report carries an error
//!
//! Handlers do NOT call the remote directly.
//!
//! # Async Commands
//!
//! Reconcilers are async because they perform network I/O. Each handler
//! creates a tokio runtime and blocks on the reconciler.

mod completion;
mod content;
mod debug;
mod deployment;
mod resolve;
mod tag;
mod update_ref;

pub use completion::completion;
pub use content::content;
pub use debug::{debug, DebugReport};
pub use deployment::deployment;
pub use resolve::resolve;
pub use tag::tag;
pub use update_ref::update_ref;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use crate::cli::args::{Cli, Command, MessageArgs, PullRequestArgs};
use crate::core::config::env::{self, first_env, parse_bool, ActionsContext};
use crate::core::config::token::{gh_cli_token, resolve_token, Token};
use crate::core::config::{Config, ConfigError};
use crate::core::message::{MessageSpec, DEFAULT_AUTHOR_TRAILER, DEFAULT_MESSAGE};
use crate::core::types::{BranchName, RepoSlug};
use crate::engine::{AutoMergeMode, PullRequestOptions};
use crate::forge::github::{GitHubForge, DEFAULT_API_BASE};
use crate::git::{Git, LocalDefaults};
use crate::ui::{Encoder, OutputFormat};

/// Environment lookup, replaceable in tests.
pub type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Global flags that take part in settings resolution.
#[derive(Debug, Clone, Default)]
pub struct GlobalFlags {
    pub cwd: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub no_cli_token: bool,
    pub api_url: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub compact: bool,
}

impl From<&Cli> for GlobalFlags {
    fn from(cli: &Cli) -> Self {
        GlobalFlags {
            cwd: cli.cwd.clone(),
            config: cli.config.clone(),
            token: cli.token.clone(),
            owner: cli.owner.clone(),
            repo: cli.repo.clone(),
            no_cli_token: cli.no_cli_token,
            api_url: cli.api_url.clone(),
            output_format: cli.output_format,
            compact: cli.compact,
        }
    }
}

/// Settings every remote command needs.
#[derive(Debug)]
pub struct Target {
    pub repository: RepoSlug,
    pub token: Token,
    /// Set when the command asked for a branch.
    pub branch: Option<BranchName>,
}

/// Execution context: flags, environment, config files and local defaults.
pub struct Context {
    pub flags: GlobalFlags,
    pub cwd: PathBuf,
    pub config: Config,
    pub actions: Option<ActionsContext>,
    pub local: LocalDefaults,
    pub git: Option<Git>,
    lookup: Lookup,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cwd", &self.cwd)
            .field("config", &self.config)
            .field("actions", &self.actions)
            .field("local", &self.local)
            .finish()
    }
}

impl Context {
    /// Build a context from the process environment.
    pub fn new(flags: GlobalFlags) -> Result<Self> {
        Self::with_lookup(flags, Box::new(|key| std::env::var(key).ok()))
    }

    /// Build a context with environment lookups routed through `lookup`.
    pub fn with_lookup(flags: GlobalFlags, lookup: Lookup) -> Result<Self> {
        let cwd = match &flags.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("reading current directory")?,
        };

        let git = match Git::open(&cwd) {
            Ok(git) => Some(git),
            Err(e) => {
                tracing::debug!("no local repository: {}", e);
                None
            }
        };

        let repo_root = git
            .as_ref()
            .and_then(|g| g.work_dir().ok())
            .map(Path::to_path_buf);
        let config = Config::load_with(flags.config.as_deref(), repo_root.as_deref(), |k| {
            lookup(k)
        })?
        .config;

        let actions = ActionsContext::from_lookup(&lookup);
        let local = git
            .as_ref()
            .map(|g| g.local_defaults(&lookup))
            .unwrap_or_default();
        tracing::debug!("local defaults: {:?}", local);

        Ok(Context {
            flags,
            cwd,
            config,
            actions,
            local,
            git,
            lookup,
        })
    }

    /// Build a context from explicit parts, without touching the filesystem.
    pub fn from_parts(
        flags: GlobalFlags,
        config: Config,
        local: LocalDefaults,
        env: HashMap<String, String>,
    ) -> Self {
        let lookup: Lookup = Box::new(move |key| env.get(key).cloned());
        let actions = ActionsContext::from_lookup(&lookup);
        Context {
            cwd: flags.cwd.clone().unwrap_or_default(),
            flags,
            config,
            actions,
            local,
            git: None,
            lookup,
        }
    }

    fn env(&self, keys: &[&str]) -> Option<String> {
        first_env(keys, &self.lookup)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    pub fn owner(&self) -> Option<String> {
        non_empty(self.flags.owner.as_deref())
            .or_else(|| self.env(env::OWNER))
            .or_else(|| non_empty(self.config.owner()))
            .or_else(|| {
                self.actions
                    .as_ref()
                    .and_then(|a| a.repository.as_ref())
                    .map(|r| r.owner.clone())
            })
            .or_else(|| self.local.repository.as_ref().map(|r| r.owner.clone()))
            .filter(|v| !v.is_empty())
    }

    pub fn repo(&self) -> Option<String> {
        non_empty(self.flags.repo.as_deref())
            .or_else(|| self.env(env::REPO))
            .or_else(|| non_empty(self.config.repo()))
            .or_else(|| {
                self.actions
                    .as_ref()
                    .and_then(|a| a.repository.as_ref())
                    .map(|r| r.name.clone())
            })
            .or_else(|| self.local.repository.as_ref().map(|r| r.name.clone()))
            .filter(|v| !v.is_empty())
    }

    pub fn branch(&self, flag: Option<&str>) -> Option<String> {
        non_empty(flag)
            .or_else(|| self.env(env::BRANCH))
            .or_else(|| non_empty(self.config.branch()))
            .or_else(|| self.actions.as_ref().and_then(|a| a.branch.clone()))
            .or_else(|| self.local.branch.clone())
            .filter(|v| !v.is_empty())
    }

    /// Resolve the token, falling back to the GitHub CLI unless disabled.
    pub fn token(&self) -> Result<Token, ConfigError> {
        let configured = non_empty(self.flags.token.as_deref())
            .or_else(|| self.env(env::TOKEN))
            .or_else(|| non_empty(self.config.token()));
        let no_cli_token = self.flags.no_cli_token;
        resolve_token(configured.as_deref(), || {
            if no_cli_token {
                None
            } else {
                gh_cli_token()
            }
        })
    }

    pub fn api_url(&self) -> String {
        non_empty(self.flags.api_url.as_deref())
            .or_else(|| self.env(env::API_URL))
            .or_else(|| non_empty(self.config.api_url()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn encoder(&self) -> Result<Encoder> {
        let format = match self.flags.output_format {
            Some(format) => format,
            None => match self.config.output() {
                Some(value) => value.parse().map_err(anyhow::Error::msg)?,
                None => OutputFormat::default(),
            },
        };
        Ok(Encoder::new(format, self.flags.compact || self.config.compact()))
    }

    /// Commit message inputs: flags, then environment, then config, then local git identity.
    pub fn message_spec(&self, args: &MessageArgs) -> MessageSpec {
        let commit = self.config.commit();

        let mut trailers = commit.trailers;
        trailers.extend(args.trailer_map());

        MessageSpec {
            message: args
                .message
                .clone()
                .or_else(|| self.env(env::MESSAGE))
                .or(commit.message)
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            author_trailer: args
                .user_trailer
                .clone()
                .or_else(|| self.env(env::AUTHOR_TRAILER))
                .or(commit.author_trailer)
                .unwrap_or_else(|| DEFAULT_AUTHOR_TRAILER.to_string()),
            author_name: args
                .user_name
                .clone()
                .or_else(|| self.env(env::USER_NAME))
                .or(commit.user_name)
                .or_else(|| self.local.user_name.clone())
                .unwrap_or_default(),
            author_email: args
                .user_email
                .clone()
                .or_else(|| self.env(env::USER_EMAIL))
                .or(commit.user_email)
                .or_else(|| self.local.user_email.clone())
                .unwrap_or_default(),
            trailers,
        }
    }

    /// Pull request settings, or `None` when no title is set.
    pub fn pull_request(&self, args: &PullRequestArgs) -> Result<Option<PullRequestOptions>> {
        let defaults = self.config.pull_request();

        let Some(title) = args
            .pr_title
            .clone()
            .or_else(|| self.env(env::PR_TITLE))
        else {
            return Ok(None);
        };

        let auto_merge = match args.pr_auto_merge {
            Some(mode) => mode,
            None => match defaults.auto_merge.as_deref() {
                Some(mode) => mode.parse().map_err(anyhow::Error::msg)?,
                None => AutoMergeMode::Off,
            },
        };

        let draft = args.pr_draft
            || self
                .env(env::PR_DRAFT)
                .and_then(|v| parse_bool(&v))
                .or(defaults.draft)
                .unwrap_or(false);

        Ok(Some(PullRequestOptions {
            title,
            body: args.pr_body.clone().or_else(|| self.env(env::PR_BODY)),
            draft,
            auto_merge,
        }))
    }

    /// Comma-separated targets from the environment.
    pub fn env_targets(&self) -> Vec<String> {
        self.env(env::TARGETS)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve and check token, owner, repo and (optionally) branch.
    ///
    /// Every missing value is reported in one error.
    pub fn target(&self, branch_flag: Option<Option<&str>>) -> Result<Target> {
        let mut missing = Vec::new();

        let token = match self.token() {
            Ok(token) => Some(token),
            Err(ConfigError::NoToken) => {
                missing.push("token");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let owner = self.owner();
        if owner.is_none() {
            missing.push("owner");
        }
        let repo = self.repo();
        if repo.is_none() {
            missing.push("repo");
        }
        let branch = match branch_flag {
            Some(flag) => {
                let branch = self.branch(flag);
                if branch.is_none() {
                    missing.push("branch");
                }
                branch
            }
            None => None,
        };

        match (token, owner, repo) {
            (Some(token), Some(owner), Some(repo)) if missing.is_empty() => {
                let repository = RepoSlug::new(owner, repo)?;
                let branch = branch.map(BranchName::new).transpose()?;
                Ok(Target {
                    repository,
                    token,
                    branch,
                })
            }
            _ => Err(ConfigError::Missing(missing).into()),
        }
    }

    /// The GitHub client for `target`.
    pub fn forge(&self, target: &Target) -> GitHubForge {
        GitHubForge::with_api_base(
            target.token.clone(),
            target.repository.clone(),
            self.api_url(),
        )
    }

    /// Write `report` to stdout and fail with `error` if set.
    pub fn emit<T: Serialize>(&self, report: &T, error: Option<&str>) -> Result<()> {
        self.encoder()?.write(&mut std::io::stdout().lock(), report)?;
        if let Some(error) = error {
            bail!("{error}");
        }
        Ok(())
    }
}

/// Run `future` to completion on a fresh runtime.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(future))
}

/// Dispatch a command to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    if let Command::Completion { shell } = cli.command {
        return completion(shell);
    }

    let ctx = Context::new(GlobalFlags::from(&cli))?;

    match cli.command {
        Command::Content(args) => content(&ctx, &args),
        Command::Resolve {
            commitish,
            branches,
            tags,
        } => resolve(&ctx, &commitish, branches, tags),
        Command::Tag(args) => tag(&ctx, &args),
        Command::UpdateRef(args) => update_ref(&ctx, &args),
        Command::Deployment(args) => deployment(&ctx, &args),
        Command::Debug { branch, message } => debug(&ctx, branch.branch.as_deref(), &message),
        Command::Completion { shell } => completion(shell),
    }
}

/// A flag or config value, with an explicitly empty one treated as unset.
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FileConfig;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn local() -> LocalDefaults {
        LocalDefaults {
            branch: Some("local-branch".into()),
            repository: Some(RepoSlug::new("local-owner", "local-repo").unwrap()),
            user_name: Some("Local User".into()),
            user_email: Some("local@example.com".into()),
        }
    }

    fn no_cli() -> GlobalFlags {
        GlobalFlags {
            no_cli_token: true,
            ..Default::default()
        }
    }

    mod precedence {
        use super::*;

        #[test]
        fn flag_beats_env_beats_config_beats_local() {
            let config = Config::from_file(FileConfig {
                owner: Some("config-owner".into()),
                repo: Some("config-repo".into()),
                ..Default::default()
            });
            let flags = GlobalFlags {
                owner: Some("flag-owner".into()),
                ..no_cli()
            };
            let ctx = Context::from_parts(
                flags,
                config,
                local(),
                env(&[("GITHUB_REPO", "env-repo")]),
            );

            assert_eq!(ctx.owner().as_deref(), Some("flag-owner"));
            assert_eq!(ctx.repo().as_deref(), Some("env-repo"));
            assert_eq!(ctx.branch(None).as_deref(), Some("local-branch"));
        }

        #[test]
        fn actions_context_beats_local() {
            let ctx = Context::from_parts(
                no_cli(),
                Config::default(),
                local(),
                env(&[
                    ("GITHUB_ACTIONS", "true"),
                    ("GITHUB_REPOSITORY", "acme/widgets"),
                    ("GITHUB_HEAD_REF", "feature"),
                ]),
            );
            assert_eq!(ctx.owner().as_deref(), Some("acme"));
            assert_eq!(ctx.repo().as_deref(), Some("widgets"));
            assert_eq!(ctx.branch(None).as_deref(), Some("feature"));
        }

        #[test]
        fn branch_flag_wins() {
            let ctx = Context::from_parts(
                no_cli(),
                Config::default(),
                local(),
                env(&[("GHUP_BRANCH", "env-branch")]),
            );
            assert_eq!(ctx.branch(Some("flag")).as_deref(), Some("flag"));
            assert_eq!(ctx.branch(None).as_deref(), Some("env-branch"));
        }

        #[test]
        fn empty_values_fall_through() {
            let config = Config::from_file(FileConfig {
                owner: Some(String::new()),
                repo: Some("config-repo".into()),
                ..Default::default()
            });
            let flags = GlobalFlags {
                owner: Some(String::new()),
                repo: Some(String::new()),
                ..no_cli()
            };
            let ctx = Context::from_parts(
                flags,
                config,
                local(),
                env(&[("GHUP_OWNER", "env-owner")]),
            );

            assert_eq!(ctx.owner().as_deref(), Some("env-owner"));
            assert_eq!(ctx.repo().as_deref(), Some("config-repo"));
            assert_eq!(ctx.branch(Some("")).as_deref(), Some("local-branch"));
        }
    }

    mod target {
        use super::*;

        #[test]
        fn all_missing_reported_together() {
            let ctx = Context::from_parts(
                no_cli(),
                Config::default(),
                LocalDefaults::default(),
                HashMap::new(),
            );
            let err = ctx.target(Some(None)).unwrap_err();
            assert_eq!(
                err.to_string(),
                "missing required configuration: token, owner, repo, branch"
            );
        }

        #[test]
        fn branch_only_checked_when_requested() {
            let ctx = Context::from_parts(
                no_cli(),
                Config::default(),
                LocalDefaults {
                    repository: Some(RepoSlug::new("acme", "widgets").unwrap()),
                    ..Default::default()
                },
                env(&[("GH_TOKEN", "secret")]),
            );
            let target = ctx.target(None).unwrap();
            assert_eq!(target.repository.to_string(), "acme/widgets");
            assert_eq!(target.token.expose(), "secret");
            assert_eq!(target.branch, None);

            let err = ctx.target(Some(None)).unwrap_err();
            assert_eq!(err.to_string(), "missing required configuration: branch");
        }

        #[test]
        fn invalid_branch_rejected() {
            let ctx = Context::from_parts(
                no_cli(),
                Config::default(),
                local(),
                env(&[("GHUP_TOKEN", "secret")]),
            );
            assert!(ctx.target(Some(Some("bad..name"))).is_err());
        }
    }

    mod message {
        use super::*;

        #[test]
        fn identity_falls_back_to_local_git() {
            let ctx = Context::from_parts(no_cli(), Config::default(), local(), HashMap::new());
            let spec = ctx.message_spec(&MessageArgs::default());
            assert_eq!(spec.message, DEFAULT_MESSAGE);
            assert_eq!(spec.author_trailer, DEFAULT_AUTHOR_TRAILER);
            assert_eq!(spec.author_name, "Local User");
            assert_eq!(
                spec.trailers(),
                vec!["Co-Authored-By: Local User <local@example.com>"]
            );
        }

        #[test]
        fn blank_trailer_flag_disables_author() {
            let ctx = Context::from_parts(no_cli(), Config::default(), local(), HashMap::new());
            let args = MessageArgs {
                message: Some("Update".into()),
                user_trailer: Some(String::new()),
                trailers: vec![("Ticket".into(), "42".into())],
                ..Default::default()
            };
            assert_eq!(ctx.message_spec(&args).build(), "Update\n\nTicket: 42");
        }

        #[test]
        fn env_overrides_config() {
            let config = Config::from_file(FileConfig {
                commit: Some(crate::core::config::CommitDefaults {
                    message: Some("from config".into()),
                    ..Default::default()
                }),
                ..Default::default()
            });
            let ctx = Context::from_parts(
                no_cli(),
                config,
                LocalDefaults::default(),
                env(&[("GHUP_MESSAGE", "from env")]),
            );
            assert_eq!(ctx.message_spec(&MessageArgs::default()).message, "from env");
        }
    }

    mod pull_request {
        use super::*;
        use crate::core::config::PullRequestDefaults;

        #[test]
        fn no_title_no_pull_request() {
            let ctx = Context::from_parts(
                no_cli(),
                Config::default(),
                LocalDefaults::default(),
                HashMap::new(),
            );
            assert_eq!(ctx.pull_request(&PullRequestArgs::default()).unwrap(), None);
        }

        #[test]
        fn env_title_with_config_defaults() {
            let config = Config::from_file(FileConfig {
                pull_request: Some(PullRequestDefaults {
                    draft: Some(true),
                    auto_merge: Some("squash".into()),
                }),
                ..Default::default()
            });
            let ctx = Context::from_parts(
                no_cli(),
                config,
                LocalDefaults::default(),
                env(&[("GHUP_PR_TITLE", "Automated update")]),
            );
            let pr = ctx
                .pull_request(&PullRequestArgs::default())
                .unwrap()
                .unwrap();
            assert_eq!(pr.title, "Automated update");
            assert!(pr.draft);
            assert_eq!(pr.auto_merge, AutoMergeMode::Squash);
        }
    }

    #[test]
    fn env_targets_split_on_commas() {
        let ctx = Context::from_parts(
            no_cli(),
            Config::default(),
            LocalDefaults::default(),
            env(&[("GHUP_TARGETS", "v1, v1.2,,latest")]),
        );
        assert_eq!(ctx.env_targets(), vec!["v1", "v1.2", "latest"]);
    }

    #[test]
    fn api_url_defaults_to_github() {
        let ctx = Context::from_parts(
            no_cli(),
            Config::default(),
            LocalDefaults::default(),
            HashMap::new(),
        );
        assert_eq!(ctx.api_url(), DEFAULT_API_BASE);
    }
}

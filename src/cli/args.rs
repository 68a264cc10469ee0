//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--token`, `-o/--owner`, `-r/--repo`: Target repository and credentials
//! - `--config <path>`: Global configuration file
//! - `--no-cli-token`: Never ask the GitHub CLI for a token
//! - `-v`: Increase log verbosity (repeatable)
//! - `-O/--output-format`, `--compact`: Report encoding
//! - `--cwd <path>`: Run as if in that directory
//!
//! Values left unset here are filled from the environment, configuration
//! files and the local checkout (see [`crate::cli::commands::Context`]).

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::core::types::RefType;
use crate::engine::AutoMergeMode;
use crate::forge::DeploymentState;
use crate::ui::OutputFormat;

/// ghup - Idempotent GitHub content, tag and ref updates via API
#[derive(Parser, Debug)]
#[command(name = "ghup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if ghup was started in this directory
    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Global configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// GitHub token or path/to/token-file
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Repository owner
    #[arg(short, long, global = true, value_name = "NAME")]
    pub owner: Option<String>,

    /// Repository name
    #[arg(short, long, global = true, value_name = "NAME", visible_alias = "name")]
    pub repo: Option<String>,

    /// Disable fallback to the GitHub CLI token
    #[arg(long, global = true)]
    pub no_cli_token: bool,

    /// REST API base URL (GitHub Enterprise)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Increase verbosity
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short = 'O', long, global = true, value_enum, value_name = "FORMAT")]
    pub output_format: Option<OutputFormat>,

    /// Single-line JSON output
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Target branch.
#[derive(Args, Debug, Clone, Default)]
pub struct BranchArgs {
    /// Target branch name
    #[arg(short, long, value_name = "NAME")]
    pub branch: Option<String>,
}

/// Commit message and trailers.
#[derive(Args, Debug, Clone, Default)]
pub struct MessageArgs {
    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Key for the commit author trailer (blank to disable)
    #[arg(long, value_name = "KEY", visible_alias = "author-trailer")]
    pub user_trailer: Option<String>,

    /// Name for the commit author trailer
    #[arg(long, value_name = "NAME", visible_alias = "author-name")]
    pub user_name: Option<String>,

    /// Email for the commit author trailer
    #[arg(long, value_name = "EMAIL", visible_alias = "author-email")]
    pub user_email: Option<String>,

    /// Extra commit trailer (repeatable)
    #[arg(long = "trailer", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub trailers: Vec<(String, String)>,
}

impl MessageArgs {
    pub fn trailer_map(&self) -> BTreeMap<String, String> {
        self.trailers.iter().cloned().collect()
    }
}

/// Parse a `key=value` pair.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid trailer {s:?}: expected key=value")),
    }
}

/// Pull request settings.
#[derive(Args, Debug, Clone, Default)]
pub struct PullRequestArgs {
    /// Pull request title; a pull request is only opened when set
    #[arg(long, value_name = "TITLE")]
    pub pr_title: Option<String>,

    /// Pull request body
    #[arg(long, value_name = "BODY")]
    pub pr_body: Option<String>,

    /// Open the pull request as a draft
    #[arg(long)]
    pub pr_draft: bool,

    /// Enable auto-merge on a new pull request
    #[arg(long, value_enum, value_name = "MODE")]
    pub pr_auto_merge: Option<AutoMergeMode>,
}

/// Inputs of the content command.
#[derive(Args, Debug, Clone)]
pub struct ContentArgs {
    /// Local files to commit (`local[<sep>remote]`)
    #[arg(value_name = "FILE_SPEC")]
    pub files: Vec<String>,

    /// Commit changes to tracked files
    #[arg(long, conflicts_with = "staged")]
    pub tracked: bool,

    /// Commit staged changes
    #[arg(long)]
    pub staged: bool,

    /// Remote file to copy (`[src-branch<sep>]src-path<sep>dst-path`)
    #[arg(short, long = "copy", value_name = "SPEC")]
    pub copy: Vec<String>,

    /// Local file to commit (`local[<sep>remote]`)
    #[arg(short, long = "update", value_name = "SPEC")]
    pub update: Vec<String>,

    /// Remote path to delete
    #[arg(short, long = "delete", value_name = "PATH")]
    pub delete: Vec<String>,

    /// File-spec separator
    #[arg(short, long, default_value = ":", value_name = "SEP")]
    pub separator: String,

    #[command(flatten)]
    pub branch: BranchArgs,

    /// Base branch for a new branch (default: the repository's default branch)
    #[arg(short = 'B', long, value_name = "NAME")]
    pub base_branch: Option<String>,

    /// Create the target branch if missing
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub create_branch: bool,

    /// Commit even when nothing changed
    #[arg(long)]
    pub allow_empty: bool,

    #[command(flatten)]
    pub message: MessageArgs,

    #[command(flatten)]
    pub pull_request: PullRequestArgs,

    /// Send every file, even if unchanged
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Inputs of the tag command.
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Tag name
    #[arg(value_name = "NAME")]
    pub tag: String,

    /// Commit-ish to tag (default: the target branch)
    #[arg(short, long)]
    pub commitish: Option<String>,

    /// Create a lightweight tag
    #[arg(long)]
    pub lightweight: bool,

    #[command(flatten)]
    pub branch: BranchArgs,

    #[command(flatten)]
    pub message: MessageArgs,

    /// Replace a conflicting tag
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Inputs of the update-ref command.
#[derive(Args, Debug, Clone)]
pub struct UpdateRefArgs {
    /// Source ref or commit
    #[arg(short, long, value_name = "REF_OR_COMMIT")]
    pub source: Option<String>,

    /// Type of an unqualified source
    #[arg(short = 'S', long, value_enum, default_value_t = RefType::Heads)]
    pub source_type: RefType,

    /// Type of unqualified targets
    #[arg(short = 'T', long, value_enum, default_value_t = RefType::Tags)]
    pub target_type: RefType,

    /// Target refs
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Force non-fast-forward updates
    #[arg(short, long, conflicts_with = "immutable")]
    pub force: bool,

    /// Never move an existing target
    #[arg(short, long)]
    pub immutable: bool,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Inputs of the deployment command.
#[derive(Args, Debug, Clone)]
pub struct DeploymentArgs {
    /// Environment name
    #[arg(value_name = "ENVIRONMENT", conflicts_with = "environment")]
    pub positional_environment: Option<String>,

    /// Environment name
    #[arg(short, long, value_name = "NAME")]
    pub environment: Option<String>,

    /// Commit-ish to deploy (default: the repository's default branch)
    #[arg(short, long)]
    pub commitish: Option<String>,

    /// Deployment state
    #[arg(short, long, value_enum, default_value_t = DeploymentState::Success)]
    pub state: DeploymentState,

    /// Mark the environment as transient
    #[arg(short = 'T', long)]
    pub transient: bool,

    /// Mark the environment as production
    #[arg(short = 'P', long)]
    pub production: bool,

    /// Deployment description
    #[arg(long)]
    pub description: Option<String>,

    /// Environment URL
    #[arg(long, value_name = "URL")]
    pub environment_url: Option<String>,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Commit file changes to a branch via the API
    #[command(
        name = "content",
        visible_alias = "commit",
        long_about = "Commit file changes to a branch via the API.\n\n\
            Content is gathered from local tracked or staged changes, copies of remote \
            files, local files and deletions. Only files whose content differs from the \
            branch are sent, so re-running with the same inputs makes no new commit. \
            A missing branch is created from the base branch.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Commit two local files to the current branch
    ghup content README.md docs/guide.md

    # Upload a local file to a different remote path
    ghup content -u build/version.txt:VERSION

    # Commit all tracked changes to a new branch and open a pull request
    ghup content --tracked -b ci/update --pr-title \"Automated update\"

    # Copy a file from another branch, delete an obsolete one
    ghup content -c release:CHANGELOG.md:CHANGELOG.md -d old.txt"
    )]
    Content(ContentArgs),

    /// Resolve a commit-ish to a SHA
    #[command(
        name = "resolve",
        long_about = "Resolve a commit-ish to a SHA, optionally finding matching branches \
            and tags."
    )]
    Resolve {
        /// Commit-ish to resolve
        #[arg(default_value = "HEAD")]
        commitish: String,

        /// List branches pointing at the commit
        #[arg(short, long)]
        branches: bool,

        /// List tags pointing at the commit
        #[arg(short, long)]
        tags: bool,
    },

    /// Create or update a tag
    #[command(
        name = "tag",
        after_help = "\
WORKFLOW EXAMPLES:
    # Annotated tag on the configured branch
    ghup tag v1.2.0 -m \"Release 1.2.0\"

    # Lightweight tag on a specific commit
    ghup tag nightly --lightweight -c 3f2a9c1

    # Move an existing tag
    ghup tag latest -c main --force"
    )]
    Tag(TagArgs),

    /// Point refs at a source ref or commit
    #[command(
        name = "update-ref",
        long_about = "Point one or more target refs at the commit of a source ref or commit.\n\n\
            Unqualified names are qualified with --source-type and --target-type. \
            Refs already at the source are left untouched. With --immutable, a target \
            pointing elsewhere is skipped instead of moved.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Move the 'stable' tag to the head of main
    ghup update-ref -s main stable

    # Fast-forward a branch to a commit
    ghup update-ref -s 3f2a9c1 -T heads release

    # Create tags that must never move
    ghup update-ref -s main --immutable v1 v1.2"
    )]
    UpdateRef(UpdateRefArgs),

    /// Update the deployment status of an environment
    #[command(name = "deployment")]
    Deployment(DeploymentArgs),

    /// Dump contextual information to aid debugging
    #[command(name = "debug", visible_alias = "info")]
    Debug {
        #[command(flatten)]
        branch: BranchArgs,

        #[command(flatten)]
        message: MessageArgs,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for ghup commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    ghup completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    ghup completion zsh >> ~/.zshrc

    # Fish
    ghup completion fish > ~/.config/fish/completions/ghup.fish

    # PowerShell
    ghup completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

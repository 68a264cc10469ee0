//! core::config::schema
//!
//! Configuration file schema.
//!
//! The same schema is used for the global file and the repository-level
//! `.ghup.toml`; repository values override global ones key by key.
//!
//! # Validation
//!
//! Values are validated after parsing (branch names must be valid, the
//! output format must be known) so a bad file fails before any remote call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Configuration file contents.
///
/// # Example
///
/// ```toml
/// owner = "acme"
/// repo = "widgets"
/// branch = "ci/updates"
/// output = "yaml"
///
/// [commit]
/// message = "chore: automated update"
/// user_name = "CI Bot"
/// user_email = "ci@example.com"
///
/// [commit.trailers]
/// Reviewed-By = "Jane Smith"
///
/// [pull_request]
/// draft = true
/// auto_merge = "squash"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Repository owner
    pub owner: Option<String>,

    /// Repository name
    pub repo: Option<String>,

    /// Target branch
    pub branch: Option<String>,

    /// Token value or path to a file containing it
    pub token: Option<String>,

    /// REST API base URL (GitHub Enterprise)
    pub api_url: Option<String>,

    /// Output format ("json" or "yaml")
    pub output: Option<String>,

    /// Compact JSON output
    pub compact: Option<bool>,

    /// Commit message defaults
    pub commit: Option<CommitDefaults>,

    /// Pull request defaults
    pub pull_request: Option<PullRequestDefaults>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.branch {
            BranchName::new(branch.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("branch: {e}")))?;
        }

        if let Some(output) = &self.output {
            if !matches!(output.as_str(), "json" | "j" | "yaml" | "y") {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid output '{output}', must be one of: json, yaml"
                )));
            }
        }

        if let Some(pr) = &self.pull_request {
            pr.validate()?;
        }

        Ok(())
    }

    /// Overlay `other` on top of `self`: any value set in `other` wins.
    pub fn merge(self, other: FileConfig) -> FileConfig {
        FileConfig {
            owner: other.owner.or(self.owner),
            repo: other.repo.or(self.repo),
            branch: other.branch.or(self.branch),
            token: other.token.or(self.token),
            api_url: other.api_url.or(self.api_url),
            output: other.output.or(self.output),
            compact: other.compact.or(self.compact),
            commit: merge_opt(self.commit, other.commit, CommitDefaults::merge),
            pull_request: merge_opt(
                self.pull_request,
                other.pull_request,
                PullRequestDefaults::merge,
            ),
        }
    }
}

fn merge_opt<T>(base: Option<T>, over: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(f(b, o)),
        (b, o) => o.or(b),
    }
}

/// Commit message defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommitDefaults {
    /// Commit message
    pub message: Option<String>,

    /// Author trailer key; an empty string disables the trailer
    pub author_trailer: Option<String>,

    /// Author trailer name
    pub user_name: Option<String>,

    /// Author trailer email
    pub user_email: Option<String>,

    /// Extra trailers
    pub trailers: BTreeMap<String, String>,
}

impl CommitDefaults {
    fn merge(self, other: CommitDefaults) -> CommitDefaults {
        let mut trailers = self.trailers;
        trailers.extend(other.trailers);
        CommitDefaults {
            message: other.message.or(self.message),
            author_trailer: other.author_trailer.or(self.author_trailer),
            user_name: other.user_name.or(self.user_name),
            user_email: other.user_email.or(self.user_email),
            trailers,
        }
    }
}

/// Pull request defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PullRequestDefaults {
    /// Open pull requests as drafts
    pub draft: Option<bool>,

    /// Auto-merge mode ("off", "merge", "squash", "rebase")
    pub auto_merge: Option<String>,
}

impl PullRequestDefaults {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(mode) = &self.auto_merge {
            if !matches!(mode.as_str(), "off" | "merge" | "squash" | "rebase") {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid auto_merge '{mode}', must be one of: off, merge, squash, rebase"
                )));
            }
        }
        Ok(())
    }

    fn merge(self, other: PullRequestDefaults) -> PullRequestDefaults {
        PullRequestDefaults {
            draft: other.draft.or(self.draft),
            auto_merge: other.auto_merge.or(self.auto_merge),
        }
    }
}

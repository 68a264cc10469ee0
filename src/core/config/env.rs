//! core::config::env
//!
//! Environment variable bindings.
//!
//! Each setting is bound to an ordered list of variables; the first one set
//! to a non-empty value wins. Lookups go through a caller-supplied function
//! so resolution can be tested without touching the process environment.

use crate::core::types::RepoSlug;

pub const TOKEN: &[&str] = &["GHUP_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"];
pub const OWNER: &[&str] = &["GHUP_OWNER", "GITHUB_OWNER", "GITHUB_REPOSITORY_OWNER"];
pub const REPO: &[&str] = &["GHUP_REPO", "GITHUB_REPO", "GITHUB_REPOSITORY_NAME"];
pub const BRANCH: &[&str] = &["GHUP_BRANCH", "CHANGE_BRANCH", "BRANCH_NAME", "GIT_BRANCH"];
pub const AUTHOR_TRAILER: &[&str] = &["GHUP_AUTHOR_TRAILER", "GHUP_TRAILER_KEY"];
pub const USER_NAME: &[&str] = &["GHUP_TRAILER_NAME", "GIT_AUTHOR_NAME", "GIT_COMMITTER_NAME"];
pub const USER_EMAIL: &[&str] = &[
    "GHUP_TRAILER_EMAIL",
    "GIT_AUTHOR_EMAIL",
    "GIT_COMMITTER_EMAIL",
];
pub const MESSAGE: &[&str] = &["GHUP_MESSAGE"];
pub const PR_TITLE: &[&str] = &["GHUP_PR_TITLE"];
pub const PR_BODY: &[&str] = &["GHUP_PR_BODY"];
pub const PR_DRAFT: &[&str] = &["GHUP_PR_DRAFT"];
pub const TARGETS: &[&str] = &["GHUP_TARGETS"];
pub const API_URL: &[&str] = &["GHUP_API_URL", "GITHUB_API_URL"];

/// First non-empty value among `keys`.
pub fn first_env(keys: &[&str], lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.is_empty())
}

/// Parse a boolean-ish environment value (`1`, `true`, `yes`, `on`).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Defaults derived from a GitHub Actions run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsContext {
    pub repository: Option<RepoSlug>,
    pub branch: Option<String>,
}

impl ActionsContext {
    /// Read the Actions context, returning `None` outside of Actions.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if get("GITHUB_ACTIONS").as_deref() != Some("true") {
            return None;
        }

        let repository = get("GITHUB_REPOSITORY").and_then(|r| r.parse().ok());

        let branch = get("GITHUB_HEAD_REF").or_else(|| {
            if get("GITHUB_REF_TYPE").as_deref() == Some("branch") {
                get("GITHUB_REF_NAME")
            } else {
                None
            }
        });

        Some(ActionsContext { repository, branch })
    }
}

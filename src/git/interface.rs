//! git::interface
//!
//! Local repository access using git2.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BareRepo`]: No working directory to read changes from
//! - [`GitError::ReadFailed`]: One or more changed files could not be read
//!
//! # Example
//!
//! ```ignore
//! use ghup::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let changes = git.tracked()?;
//! println!("{} files to upload", changes.updates().len());
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::types::{BranchName, Oid, RepoSlug, TypeError};
use crate::engine::ChangeSet;
use crate::forge::github::parse_github_url;

/// Remote used when a branch has no upstream configured.
const DEFAULT_REMOTE: &str = "origin";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Changed files that could not be read.
    #[error("{}", .0.join("; "))]
    ReadFailed(Vec<String>),

    /// Invalid name or object id from the repository.
    #[error("invalid value: {0}")]
    Invalid(String),

    /// Other git errors.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::Invalid(err.to_string())
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Untracked files do not make the tree dirty.
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }
}

/// Defaults derived from the local checkout and CI environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalDefaults {
    pub branch: Option<String>,
    pub repository: Option<RepoSlug>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Split a CI-style `GIT_BRANCH` value (`remote/branch`).
fn split_remote_branch(value: &str) -> Option<(&str, &str)> {
    value
        .split_once('/')
        .filter(|(remote, branch)| !remote.is_empty() && !branch.is_empty())
}

/// The local Git repository.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Root of the working tree.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // HEAD
    // =========================================================================

    /// The current branch name, or `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    /// The HEAD commit, or `None` in a repository without commits.
    pub fn head_commit(&self) -> Result<Option<Oid>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };

        let commit = head.peel_to_commit()?;
        Ok(Some(Oid::new(commit.id().to_string())?))
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Count staged, unstaged and untracked changes.
    pub fn worktree_status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }

            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    /// Check if working tree is clean (no staged or unstaged changes).
    pub fn is_clean(&self) -> Result<bool, GitError> {
        Ok(self.worktree_status()?.is_clean())
    }

    /// Changed tracked files, with content read from the working tree.
    ///
    /// Staged additions and modifications are included as well as unstaged
    /// modifications. A file deleted from the working tree is a deletion
    /// even if a modification of it is staged. Untracked files are ignored.
    pub fn tracked(&self) -> Result<ChangeSet, GitError> {
        let work_dir = self.work_dir()?;
        let mut changes = ChangeSet::new();
        let mut errors = Vec::new();

        for (path, status) in self.changed_paths()? {
            debug!("{:?} {}", status, path);
            if status.is_wt_deleted() || status.is_index_deleted() {
                changes.delete(path);
            } else if status.is_index_new()
                || status.is_index_modified()
                || status.is_wt_modified()
            {
                match std::fs::read(work_dir.join(&path)) {
                    Ok(content) => changes.upsert(path, content),
                    Err(e) => errors.push(format!("reading {path}: {e}")),
                }
            }
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(GitError::ReadFailed(errors))
        }
    }

    /// Staged changes, with content read from the index.
    pub fn staged(&self) -> Result<ChangeSet, GitError> {
        let index = self.repo.index()?;
        let mut changes = ChangeSet::new();
        let mut errors = Vec::new();

        for (path, status) in self.changed_paths()? {
            if status.is_index_deleted() {
                changes.delete(path);
            } else if status.is_index_new() || status.is_index_modified() {
                let blob = index
                    .get_path(Path::new(&path), 0)
                    .ok_or_else(|| format!("{path}: not in index"))
                    .and_then(|entry| {
                        self.repo
                            .find_blob(entry.id)
                            .map_err(|e| format!("{path}: {}", e.message()))
                    });
                match blob {
                    Ok(blob) => changes.upsert(path, blob.content().to_vec()),
                    Err(e) => errors.push(format!("reading index entry {e}")),
                }
            }
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(GitError::ReadFailed(errors))
        }
    }

    /// Status of every changed tracked path.
    fn changed_paths(&self) -> Result<Vec<(String, git2::Status)>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| entry.path().map(|p| (p.to_string(), entry.status())))
            .collect())
    }

    // =========================================================================
    // Remotes and Defaults
    // =========================================================================

    /// Get the URL for a remote, or `None` if it doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The remote a branch tracks, defaulting to `origin`.
    fn branch_remote(&self, branch: &str) -> String {
        self.repo
            .config()
            .and_then(|c| c.get_string(&format!("branch.{branch}.remote")))
            .unwrap_or_else(|_| DEFAULT_REMOTE.to_string())
    }

    /// Defaults for branch, repository and trailer identity.
    ///
    /// `GIT_BRANCH=remote/branch` and `GIT_URL` (set by CI systems) take
    /// precedence over the checkout. Only github.com remotes yield a
    /// repository. Identity comes from the global git config.
    pub fn local_defaults(&self, lookup: &impl Fn(&str) -> Option<String>) -> LocalDefaults {
        let mut defaults = LocalDefaults::default();

        let ci_branch = lookup("GIT_BRANCH").unwrap_or_default();
        let remote = match split_remote_branch(&ci_branch) {
            Some((remote, branch)) => {
                defaults.branch = Some(branch.to_string());
                remote.to_string()
            }
            None => match self.current_branch() {
                Ok(Some(branch)) => {
                    let remote = self.branch_remote(branch.as_str());
                    defaults.branch = Some(branch.to_string());
                    remote
                }
                _ => DEFAULT_REMOTE.to_string(),
            },
        };

        defaults.repository = lookup("GIT_URL")
            .and_then(|url| parse_github_url(&url))
            .or_else(|| {
                self.remote_url(&remote)
                    .ok()
                    .flatten()
                    .and_then(|url| parse_github_url(&url))
            });

        if let Some(config) = global_config() {
            defaults.user_name = config.get_string("user.name").ok();
            defaults.user_email = config.get_string("user.email").ok();
        }

        defaults
    }
}

/// The user's global git config, if any.
fn global_config() -> Option<git2::Config> {
    git2::Config::open_default()
        .and_then(|c| c.open_level(git2::ConfigLevel::Global))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod worktree_status {
        use super::*;

        #[test]
        fn default_is_clean() {
            assert!(WorktreeStatus::default().is_clean());
        }

        #[test]
        fn staged_changes() {
            let status = WorktreeStatus {
                staged: 3,
                ..Default::default()
            };
            assert!(!status.is_clean());
        }

        #[test]
        fn conflicts_make_dirty() {
            let status = WorktreeStatus {
                has_conflicts: true,
                ..Default::default()
            };
            assert!(!status.is_clean());
        }

        #[test]
        fn untracked_not_dirty() {
            let status = WorktreeStatus {
                untracked: 5,
                ..Default::default()
            };
            assert!(status.is_clean());
        }
    }

    mod ci_branch {
        use super::*;

        #[test]
        fn remote_and_branch() {
            assert_eq!(
                split_remote_branch("origin/feature/x"),
                Some(("origin", "feature/x"))
            );
        }

        #[test]
        fn bare_branch_is_ignored() {
            assert_eq!(split_remote_branch("main"), None);
            assert_eq!(split_remote_branch("origin/"), None);
            assert_eq!(split_remote_branch(""), None);
        }
    }

    #[test]
    fn read_errors_are_joined() {
        let err = GitError::ReadFailed(vec!["reading a: gone".into(), "reading b: gone".into()]);
        assert_eq!(err.to_string(), "reading a: gone; reading b: gone");
    }

    #[test]
    fn open_outside_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Git::open(dir.path()).unwrap_err();
        assert!(matches!(err, GitError::NotARepo { .. }));
    }
}

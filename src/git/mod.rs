//! git
//!
//! Read-only access to the local checkout.
//!
//! # Architecture
//!
//! This module is the **only** importer of `git2`. It never writes to the
//! repository; it supplies the content set for the tracked/staged modes of
//! the content command and the local defaults used during configuration
//! resolution.
//!
//! # Example
//!
//! ```ignore
//! use ghup::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let defaults = git.local_defaults(&|key| std::env::var(key).ok());
//! let staged = git.staged()?;
//! ```

mod interface;

pub use interface::{Git, GitError, LocalDefaults, WorktreeStatus};

//! core
//!
//! Core domain types and pure helpers for ghup.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepoSlug, BranchName, RefName, Oid
//! - [`hash`] - Git-compatible blob hashing
//! - [`message`] - Commit message and trailer construction
//! - [`filespec`] - Update/copy/delete file-spec parsing
//! - [`config`] - Configuration schema, environment bindings and token resolution
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid names reaching the remote
//! - Nothing here performs network I/O

pub mod config;
pub mod filespec;
pub mod hash;
pub mod message;
pub mod types;

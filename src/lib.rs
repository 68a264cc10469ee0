//! ghup - Reconcile GitHub repository state through the API
//!
//! ghup pushes file changes, refs, tags and deployment statuses to GitHub
//! without a local clone. Every command describes a desired state, checks
//! what the remote already has, and only writes what differs. The result is
//! printed as a JSON or YAML report.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing, settings resolution and report output
//! - [`engine`] - Reconcilers for content, refs, tags and deployments
//! - [`core`] - Domain types, file specs, hashing, messages and config
//! - [`git`] - Read-only access to the local checkout
//! - [`forge`] - The GitHub API client and its in-memory double
//! - [`ui`] - Logging and report encoding
//!
//! # Invariants
//!
//! 1. A reconciler never writes when the remote already matches
//! 2. Dry runs perform reads only
//! 3. Every run produces a report, including failed ones

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod git;
pub mod ui;

//! forge
//!
//! Abstraction over the hosted repository API.
//!
//! # Architecture
//!
//! The `Forge` trait defines every remote read and write the reconcilers
//! need. Reconcilers take `&dyn Forge` and never import a concrete
//! implementation, so the same code runs against GitHub and the mock.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using REST and GraphQL APIs
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use ghup::forge::{github::GitHubForge, Forge};
//!
//! let forge = GitHubForge::new(token, "owner/repo".parse()?);
//! let info = forge.repository_info().await?;
//! println!("{} is on {}", forge.repository(), info.default_branch);
//! ```

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;

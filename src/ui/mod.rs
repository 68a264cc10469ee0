//! ui
//!
//! Output and diagnostics.
//!
//! # Modules
//!
//! - [`output`] - Report encoding (JSON or YAML) to stdout
//! - [`logging`] - `tracing` subscriber writing to stderr

pub mod logging;
pub mod output;

pub use output::{Encoder, OutputFormat};

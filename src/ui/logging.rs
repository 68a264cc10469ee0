//! ui::logging
//!
//! Diagnostics go to stderr through `tracing`; stdout carries only the report.
//!
//! ```text
//! -v count   0     1     2      3+
//! level      warn  info  debug  trace
//! ```
//!
//! `RUST_LOG`, when set, replaces the level derived from `-v`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// `EnvFilter` directive for a `-v` count.
pub fn filter_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter, preferring a non-empty `rust_log`.
fn build_filter(verbosity: u8, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(filter_directive(verbosity)))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbosity: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(verbosity, rust_log.as_deref());

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .without_time()
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(filter_directive(0), "warn");
        assert_eq!(filter_directive(1), "info");
        assert_eq!(filter_directive(2), "debug");
        assert_eq!(filter_directive(7), "trace");
    }

    #[test]
    fn rust_log_overrides_flag() {
        let filter = build_filter(0, Some("ghup=debug"));
        assert_eq!(filter.to_string(), "ghup=debug");
    }

    #[test]
    fn empty_rust_log_is_ignored() {
        assert_eq!(build_filter(1, Some("")).to_string(), "info");
        assert_eq!(build_filter(2, None).to_string(), "debug");
    }
}

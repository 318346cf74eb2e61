//! Structured tracing initialization.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber writing to stderr, filtered by
/// `directive` (falls back to the `RUST_LOG` environment variable, then to
/// `info`).
///
/// Logs go to stderr rather than stdout so they never interleave with the
/// broker's line-delimited JSON-RPC responses on stdout.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_new(directive)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

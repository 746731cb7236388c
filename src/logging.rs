//! Tracing subscriber setup for the entry points

use std::io;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install a stderr subscriber filtered by `RUST_LOG`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

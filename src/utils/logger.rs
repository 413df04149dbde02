//! Logging setup

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies to every
/// target. Calling this twice is harmless (the second call is ignored).
pub fn init_logger(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

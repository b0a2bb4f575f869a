//! Logging setup for processes embedding paramtree.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `log_level` (a level or filter
/// directive). `RUST_LOG`, when set, takes precedence. Safe to call more than
/// once; later calls are ignored.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Convenience for config-driven callers.
pub fn init_from_config(config: &paramconf::TelemetryConfig) {
    init_tracing(&config.log_level);
}

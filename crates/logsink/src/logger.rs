//! Tracing bootstrap for hosts embedding the engine.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber writing formatted events to
/// stderr, filtered by `level` (an `EnvFilter` directive such as `"info"`
/// or `"logsink=debug"`). Unparsable directives fall back to `info`.
/// Installing twice is a no-op, so tests can call this freely.
pub fn init(level: &str) {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

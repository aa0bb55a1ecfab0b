//! Logging helpers
//!
//! The crate itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`init_tracing`].

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Placeholder written in place of secret values
pub const REDACTED: &str = "[REDACTED]";

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"keyway_connection=debug"`).
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .unwrap_or(());
}

/// Redacted rendering of a secret, keeping only whether it is empty
pub fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { REDACTED }
}

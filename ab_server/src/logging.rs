//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber with an env-filter so log levels are
//! tunable via `RUST_LOG`. The game library logs through the `log` facade;
//! those records are bridged into the same subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging.
///
/// Log levels default to `info` and can be overridden per target via the
/// `RUST_LOG` environment variable.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

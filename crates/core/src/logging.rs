//! Structured logging infrastructure for the REDAP gateway.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging from the `[logging]` config section.
///
/// `RUST_LOG` still wins over `config.level` when it is set.
///
/// # Example
/// ```no_run
/// use redap_core::{logging, LogFormat, LoggingConfig};
///
/// logging::init_with(&LoggingConfig {
///     format: LogFormat::Json,
///     level: "info".into(),
/// });
/// tracing::info!(service = "redap-gateway", "Service started");
/// ```
pub fn init_with(config: &LoggingConfig) {
    let filter = env_filter(&config.level);
    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init(),
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

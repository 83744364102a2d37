//! # Structured Logging
//!
//! Provides structured logging setup using the tracing ecosystem.

use crate::config::ObservabilityConfig;
use crate::errors::{CertforgeError, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the
/// configured log level. With `json_logging` enabled, log entries are
/// emitted as JSON for machine ingestion.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            CertforgeError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let init_result = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    init_result
        .map_err(|e| CertforgeError::config(format!("Failed to initialize tracing: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        database_url = %config.database.url,
        auto_migrate = %config.database.auto_migrate,
        probe_interval_s = %config.database.probe_interval_seconds,
        json_logging = %config.observability.json_logging,
        "certforge service configuration"
    );
}

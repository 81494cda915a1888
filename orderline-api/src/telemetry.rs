//! Tracing Subscriber Initialization
//!
//! Structured JSON logs to stdout. The filter comes from `RUST_LOG` when set,
//! otherwise from the configured log level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};

/// Build the log filter: `RUST_LOG` wins, else `default_level` for this
/// workspace's crates and `tower_http`, and `warn` for everything else.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "orderline_api={level},orderline_storage={level},tower_http={level},warn",
            level = default_level
        ))
    })
}

/// Install the global tracing subscriber.
///
/// Must be called once at startup; a second call returns an error.
pub fn init_tracing(config: &ServiceConfig) -> ApiResult<()> {
    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        "Telemetry initialized"
    );

    Ok(())
}

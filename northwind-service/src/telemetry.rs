//! Tracing Subscriber Initialization
//!
//! Installs a global `tracing` subscriber with an `EnvFilter` and either
//! human-readable or JSON line output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// `EnvFilter` directives, e.g. "northwind_storage=debug,info"
    pub log_filter: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "northwind-service".to_string(),
            log_filter: "northwind_storage=info,northwind_service=info,warn".to_string(),
            json_logs: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup. A second call, or a call after another subscriber
/// was installed, returns an error and leaves the existing one in place.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter = EnvFilter::try_new(&config.log_filter).map_err(|e| {
        ApiError::internal_error(format!(
            "Invalid log filter '{}': {}",
            config.log_filter, e
        ))
    })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            log_filter: "northwind=verbose".to_string(),
            ..TelemetryConfig::default()
        };
        let err = init_tracing(&config).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(err.message.contains("Invalid log filter"));
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig::default();
        // Either this call or one from another test installs the subscriber.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}

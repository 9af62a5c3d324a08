//! Service Configuration Module
//!
//! Configuration for the repository facade, the entity caches and telemetry.
//! Configuration is loaded from environment variables with sensible defaults
//! for development.

use std::time::Duration;

use northwind_core::{CacheConfig, NorthwindResult, RepositoryConfig};

use crate::telemetry::TelemetryConfig;

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound on a single store call.
    pub store_timeout: Duration,

    /// Initial capacity of each entity cache.
    pub cache_capacity: usize,

    /// Logging and tracing settings.
    pub telemetry: TelemetryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_timeout: RepositoryConfig::default().store_timeout,
            cache_capacity: CacheConfig::default().initial_capacity,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// Environment variables:
    /// - `NORTHWIND_STORE_TIMEOUT_MS`: Store call timeout in milliseconds (default: 5000)
    /// - `NORTHWIND_CACHE_CAPACITY`: Initial entries per cache (default: 128)
    /// - `NORTHWIND_LOG_FILTER`: `EnvFilter` directives (default: "northwind=info,warn")
    /// - `NORTHWIND_LOG_JSON`: "true" or "1" for JSON log lines (default: false)
    /// - `NORTHWIND_SERVICE_NAME`: Service name in log output (default: "northwind-service")
    ///
    /// Unparseable values fall back to their defaults. Call
    /// [`ServiceConfig::validate`] before use.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let store_timeout = lookup("NORTHWIND_STORE_TIMEOUT_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.store_timeout);

        let cache_capacity = lookup("NORTHWIND_CACHE_CAPACITY")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.cache_capacity);

        let log_filter = lookup("NORTHWIND_LOG_FILTER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.telemetry.log_filter);

        let json_logs = lookup("NORTHWIND_LOG_JSON")
            .map(|s| {
                let s = s.to_lowercase();
                s == "true" || s == "1"
            })
            .unwrap_or(defaults.telemetry.json_logs);

        let service_name = lookup("NORTHWIND_SERVICE_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.telemetry.service_name);

        Self {
            store_timeout,
            cache_capacity,
            telemetry: TelemetryConfig {
                service_name,
                log_filter,
                json_logs,
            },
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> NorthwindResult<()> {
        self.repository_config().validate()
    }

    /// Repository settings derived from this config.
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig::new().with_store_timeout(self.store_timeout)
    }

    /// Cache settings derived from this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().with_initial_capacity(self.cache_capacity)
    }
}

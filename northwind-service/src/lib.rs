//! Northwind Service - Process Bootstrap
//!
//! Wires the entity caches into a running process:
//! - [`ServiceConfig`] loads settings from `NORTHWIND_*` environment variables
//! - [`init_tracing`] installs the tracing subscriber
//! - [`ServiceState`] owns the process-wide caches and builds repositories
//! - [`ApiError`] maps repository failures onto status-coded errors for the
//!   HTTP collaborator

pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::ServiceState;
pub use telemetry::{init_tracing, TelemetryConfig};

/// Load configuration from the environment, initialize tracing and build the
/// shared state.
pub fn bootstrap() -> ApiResult<ServiceState> {
    let config = ServiceConfig::from_env();
    init_tracing(&config.telemetry)?;
    let state = ServiceState::new(&config)?;
    tracing::info!(service_name = %config.telemetry.service_name, "service bootstrapped");
    Ok(state)
}

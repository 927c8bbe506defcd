//! Observability for the Hermes service broker layer.
//!
//! - **Logging**: `tracing-subscriber` with an env filter, JSON or pretty output
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_operations_total` | Counter | `operation`, `status` | Dispatched broker operations |
//! | `hermes_operation_duration_seconds` | Histogram | `operation` | Operation latency |
//! | `hermes_in_flight_operations` | Gauge | - | Operations currently running |
//!
//! ```text
//! # TYPE hermes_operations_total counter
//! hermes_operations_total{operation="create_instance",status="201"} 12
//! hermes_operations_total{operation="delete_binding",status="410"} 3
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::builder()
//!         .service_name("mysql-broker")
//!         .metrics_addr("0.0.0.0:9090")
//!         .build();
//!
//!     init_telemetry(&config).expect("telemetry");
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use self::metrics::{
    init_metrics, record_operation, render_metrics, InFlightGuard, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem failure.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_everything_disabled() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                enabled: false,
                ..LogConfig::default()
            })
            .without_metrics()
            .build();

        assert!(init_telemetry(&config).is_ok());
    }
}

//! Prometheus metrics for broker operations.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_operations_total` | Counter | `operation`, `status` | Dispatched broker operations |
//! | `hermes_operation_duration_seconds` | Histogram | `operation` | Operation latency |
//! | `hermes_in_flight_operations` | Gauge | - | Operations currently running |
//!
//! Recording functions are safe to call before [`init_metrics`]; the
//! `metrics` facade drops observations while no recorder is installed.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Operation counter name.
pub const OPERATIONS_TOTAL: &str = "hermes_operations_total";

/// Operation latency histogram name.
pub const OPERATION_DURATION_SECONDS: &str = "hermes_operation_duration_seconds";

/// In-flight gauge name.
pub const IN_FLIGHT_OPERATIONS: &str = "hermes_in_flight_operations";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address the Prometheus scrape endpoint listens on.
    pub addr: String,

    /// Histogram buckets for operation latency, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and spawns its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// - [`TelemetryError::InvalidAddress`] when `addr` is not a socket address
/// - [`TelemetryError::MetricsInit`] when there is no runtime, the buckets
///   are rejected, or a recorder is already installed
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| TelemetryError::MetricsInit(format!("no Tokio runtime: {e}")))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(&config.duration_buckets)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|_| {
        TelemetryError::MetricsInit("a metrics recorder is already installed".to_string())
    })?;
    let _ = METRICS_HANDLE.set(handle);

    runtime.spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "Prometheus exporter stopped");
        }
    });

    register_metric_descriptions();
    tracing::info!(%addr, "Prometheus metrics endpoint started");

    Ok(())
}

/// Renders the current metrics in Prometheus text format.
///
/// Returns `None` before [`init_metrics`] succeeded.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(OPERATIONS_TOTAL, "Total number of broker operations dispatched");
    describe_histogram!(
        OPERATION_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Broker operation duration in seconds"
    );
    describe_gauge!(IN_FLIGHT_OPERATIONS, "Broker operations currently running");
}

/// Records a completed broker operation.
///
/// `operation` is the operation name (e.g., `create_instance`, `catalog`).
pub fn record_operation(operation: &str, status_code: u16, duration: Duration) {
    counter!(
        OPERATIONS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        OPERATION_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Keeps the in-flight gauge raised while alive.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_OPERATIONS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_OPERATIONS).decrement(1.0);
    }
}

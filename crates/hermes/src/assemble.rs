//! Turns a [`HermesConfig`] into the settings each crate takes, and runs a
//! broker from it.

use std::time::Duration;

use hermes_config::{ConfigError, HermesConfig, LogFormat};
use hermes_middleware::PipelineSettings;
use hermes_server::{BrokerBuilder, Server, ServerConfig, ServerError};
use hermes_telemetry::{LogConfig, MetricsConfig, TelemetryConfig, TelemetryError};
use http::HeaderName;
use thiserror::Error;

/// Errors raised while starting a broker from configuration.
#[derive(Debug, Error)]
pub enum HermesError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The broker could not be assembled or the listener failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Builds the middleware settings from the `api` section.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] naming the field whose header name
/// is not a valid HTTP header name.
///
/// # Example
///
/// ```
/// use hermes::config::HermesConfig;
///
/// let settings = hermes::pipeline_settings(&HermesConfig::default()).unwrap();
/// assert_eq!(settings.version_header, "x-broker-api-version");
/// assert!(settings.expected_version.is_none());
/// ```
pub fn pipeline_settings(config: &HermesConfig) -> Result<PipelineSettings, ConfigError> {
    let api = &config.api;
    Ok(PipelineSettings {
        service_name: config.telemetry.service_name.clone(),
        version_header: header_name("api.version_header", &api.version_header)?,
        expected_version: api.expected_version.clone(),
        api_info_location_header: header_name(
            "api.api_info_location_header",
            &api.api_info_location_header,
        )?,
        originating_identity_header: header_name(
            "api.originating_identity_header",
            &api.originating_identity_header,
        )?,
        request_identity_header: header_name(
            "api.request_identity_header",
            &api.request_identity_header,
        )?,
    })
}

fn header_name(field: &str, value: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(value.as_bytes())
        .map_err(|_| ConfigError::invalid_value(field, format!("invalid header name: {value}")))
}

/// Builds the telemetry configuration from the `telemetry` section.
#[must_use]
pub fn telemetry_config(config: &HermesConfig) -> TelemetryConfig {
    let section = &config.telemetry;
    let logging = &section.logging;
    let json = logging.format == LogFormat::Json;

    TelemetryConfig {
        service_name: section.service_name.clone(),
        metrics: MetricsConfig {
            enabled: section.metrics.enabled,
            addr: section.metrics.addr.clone(),
            duration_buckets: section.metrics.histogram_buckets.clone(),
        },
        logging: LogConfig {
            enabled: logging.enabled,
            level: logging.level.clone(),
            json_format: json,
            span_events: !json,
            file_line_info: logging.include_location,
            include_target: true,
            ansi: logging.ansi_enabled,
        },
    }
}

/// Builds the listener configuration from the `server` section.
#[must_use]
pub fn server_config(config: &HermesConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .request_timeout(Duration::from_millis(config.server.request_timeout_ms))
        .build()
}

/// Initializes telemetry, assembles the broker and serves it until SIGTERM
/// or SIGINT.
///
/// The builder must already carry the catalog and the broker services; the
/// pipeline settings and base path come from `config`.
///
/// # Errors
///
/// Returns the first configuration, telemetry, assembly or listener failure.
pub async fn serve(config: &HermesConfig, broker: BrokerBuilder) -> Result<(), HermesError> {
    config.validate()?;
    hermes_telemetry::init_telemetry(&telemetry_config(config))?;

    let mut broker = broker.settings(pipeline_settings(config)?);
    if let Some(base_path) = &config.server.base_path {
        broker = broker.base_path(base_path.clone());
    }
    let broker = broker.build()?;

    tracing::info!(
        addr = %config.server.http_addr,
        routes = broker.router().route_count(),
        expected_version = config.api.expected_version.as_ref().map_or("unset", |v| v.as_str()),
        "starting broker"
    );

    Server::new(server_config(config), broker).run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::ExpectedApiVersion;

    #[test]
    fn test_pipeline_settings_from_config() {
        let mut config = HermesConfig::default();
        config.api.expected_version = Some(ExpectedApiVersion::parse("2.14"));
        config.api.request_identity_header = "X-Correlation-Id".to_string();
        config.telemetry.service_name = "mysql-broker".to_string();

        let settings = pipeline_settings(&config).unwrap();
        assert_eq!(settings.request_identity_header, "x-correlation-id");
        assert_eq!(settings.service_name, "mysql-broker");
        assert_eq!(settings.expected_version, Some(ExpectedApiVersion::parse("2.14")));
    }

    #[test]
    fn test_pipeline_settings_rejects_bad_header() {
        let mut config = HermesConfig::default();
        config.api.originating_identity_header = "not a header".to_string();

        let err = pipeline_settings(&config).unwrap_err();
        assert!(err.to_string().contains("api.originating_identity_header"));
    }

    #[test]
    fn test_telemetry_config_from_config() {
        let mut config = HermesConfig::default();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config.telemetry.metrics.enabled = false;

        let telemetry = telemetry_config(&config);
        assert!(!telemetry.logging.json_format);
        assert!(telemetry.logging.file_line_info);
        assert!(!telemetry.metrics.enabled);
        assert_eq!(telemetry.service_name, config.telemetry.service_name);
    }

    #[test]
    fn test_server_config_from_config() {
        let mut config = HermesConfig::default();
        config.server.http_addr = "127.0.0.1:9000".to_string();
        config.server.shutdown_timeout_secs = 5;
        config.server.request_timeout_ms = 1500;

        let server = server_config(&config);
        assert_eq!(server.http_addr(), "127.0.0.1:9000");
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(server.request_timeout(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_config() {
        let mut config = HermesConfig::default();
        config.server.http_addr = "nowhere".to_string();

        let result = serve(&config, hermes_server::Broker::builder()).await;
        assert!(matches!(result, Err(HermesError::Config(_))));
    }
}

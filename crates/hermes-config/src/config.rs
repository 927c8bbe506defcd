//! Main configuration types.
//!
//! This module provides the top-level [`HermesConfig`] struct and its builder.

use std::net::SocketAddr;

use http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::{ApiConfig, ConfigError, LogFormat, LoggingConfig, ServerConfig, TelemetryConfigSection};

/// Complete broker configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.api.expected_version.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Broker API headers and version.
    #[serde(default)]
    pub api: ApiConfig,

    /// Telemetry configuration (metrics, logging).
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl HermesConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - the server or metrics address is not a socket address
    /// - the base path does not start with `/` or ends with `/`
    /// - a header name is not a valid HTTP header name
    /// - the request or shutdown timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_socket_addr("server.http_addr", &self.server.http_addr)?;

        if self.telemetry.metrics.enabled {
            validate_socket_addr("telemetry.metrics.addr", &self.telemetry.metrics.addr)?;
        }

        if let Some(base_path) = &self.server.base_path {
            if !base_path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "server.base_path",
                    format!("must start with '/': {base_path}"),
                ));
            }
            if base_path.len() > 1 && base_path.ends_with('/') {
                return Err(ConfigError::invalid_value(
                    "server.base_path",
                    format!("must not end with '/': {base_path}"),
                ));
            }
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            ("api.version_header", &self.api.version_header),
            ("api.originating_identity_header", &self.api.originating_identity_header),
            ("api.request_identity_header", &self.api.request_identity_header),
            ("api.api_info_location_header", &self.api.api_info_location_header),
        ] {
            if HeaderName::from_bytes(value.as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("invalid header name: {value}"),
                ));
            }
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, no metrics exporter, local bind.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                http_addr: "127.0.0.1:8080".to_string(),
                ..ServerConfig::default()
            },
            api: ApiConfig::default(),
            telemetry: TelemetryConfigSection {
                metrics: crate::MetricsConfig {
                    enabled: false,
                    ..crate::MetricsConfig::default()
                },
                logging: LoggingConfig {
                    level: "debug".to_string(),
                    format: LogFormat::Pretty,
                    ansi_enabled: true,
                    include_location: true,
                    ..LoggingConfig::default()
                },
                ..TelemetryConfigSection::default()
            },
        }
    }

    /// Production preset: JSON logs and the metrics exporter.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

fn validate_socket_addr(field: &str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ConfigError::invalid_value(field, format!("invalid socket address: {value}")))
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    server: Option<ServerConfig>,
    api: Option<ApiConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl HermesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the API configuration.
    #[must_use]
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        HermesConfig {
            server: self.server.unwrap_or_default(),
            api: self.api.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn build_validated(self) -> Result<HermesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::ExpectedApiVersion;

    #[test]
    fn test_default_config_is_valid() {
        let config = HermesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config, HermesConfig::production());
    }

    #[test]
    fn test_builder_sections() {
        let config = HermesConfig::builder()
            .server(ServerConfig {
                http_addr: "127.0.0.1:3000".to_string(),
                ..Default::default()
            })
            .api(ApiConfig {
                expected_version: Some(ExpectedApiVersion::parse("2.14")),
                ..Default::default()
            })
            .build();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.api.expected_version.unwrap().as_str(), "2.14");
        assert_eq!(config.telemetry.service_name, "hermes");
    }

    #[test]
    fn test_validate_invalid_server_addr() {
        let config = HermesConfig::builder()
            .server(ServerConfig {
                http_addr: "localhost".to_string(),
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_validate_metrics_addr_only_when_enabled() {
        let mut config = HermesConfig::default();
        config.telemetry.metrics.addr = "nowhere".to_string();
        assert!(config.validate().is_err());

        config.telemetry.metrics.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_base_path() {
        let mut config = HermesConfig::default();

        config.server.base_path = Some("broker".to_string());
        assert!(config.validate().is_err());

        config.server.base_path = Some("/broker/".to_string());
        assert!(config.validate().is_err());

        config.server.base_path = Some("/broker".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_header_names() {
        let mut config = HermesConfig::default();
        config.api.version_header = "X Broker Version".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api.version_header"));
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = HermesConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = HermesConfig::default();
        config.server.shutdown_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_development_preset() {
        let config = HermesConfig::development();
        assert_eq!(config.telemetry.logging.level, "debug");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert!(!config.telemetry.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_validated_failure() {
        let result = HermesConfig::builder()
            .server(ServerConfig {
                base_path: Some("v2".to_string()),
                ..Default::default()
            })
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = HermesConfig::development();
        let text = toml::to_string(&config).unwrap();
        let parsed: HermesConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<HermesConfig, _> = toml::from_str(
            r#"
            [authorization]
            enabled = true
        "#,
        );
        assert!(result.is_err());
    }
}

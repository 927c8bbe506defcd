//! Typed configuration for the Hermes service broker layer.
//!
//! - TOML and JSON configuration files
//! - `.env` files through `dotenvy`
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//!
//! The root type is [`HermesConfig`]:
//!
//! - [`ServerConfig`] - bind address, timeouts, route prefix
//! - [`ApiConfig`] - protocol header names and the accepted API version
//! - [`TelemetryConfigSection`] - logging and metrics
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("broker.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! println!("Broker listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! base_path = "/broker"
//!
//! [api]
//! version_header = "X-Broker-API-Version"
//! expected_version = "2.14"
//!
//! [telemetry]
//! service_name = "mysql-broker"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERMES__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `HERMES__API__EXPECTED_VERSION=2.14`
//! - `HERMES__TELEMETRY__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HermesConfig::default();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
        assert_eq!(config.server.shutdown_timeout_secs, 30);
        assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    }
}

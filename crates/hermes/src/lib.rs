//! # Hermes
//!
//! **Open Service Broker protocol layer**
//!
//! Hermes sits between a platform (Cloud Foundry, Kubernetes) and your
//! broker implementation. It takes care of the protocol so your code only
//! implements the broker traits:
//!
//! - **API version gate** - Rejects requests whose `X-Broker-API-Version` does not match
//! - **Identity decoding** - Turns `X-Broker-API-Originating-Identity` into a typed
//!   [`core::Context`]
//! - **Catalog resolution** - Resolves service and plan ids before your code runs
//! - **Status codes** - Derives every HTTP status from your response or failure
//! - **Catalog caching** - `ETag` / `If-None-Match` on `GET /v2/catalog`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hermes::prelude::*;
//! use hermes::config::ConfigLoader;
//! # use hermes::core::fixtures::sample_catalog;
//!
//! struct MyInstances;
//!
//! #[async_trait::async_trait]
//! impl ServiceInstanceService for MyInstances {
//!     async fn create_service_instance(
//!         &self,
//!         _request: CreateServiceInstanceRequest,
//!     ) -> BrokerResult<Option<CreateServiceInstanceResponse>> {
//!         Ok(Some(CreateServiceInstanceResponse::new().with_dashboard_url("https://dash")))
//!     }
//!
//!     async fn delete_service_instance(
//!         &self,
//!         _request: DeleteServiceInstanceRequest,
//!     ) -> BrokerResult<Option<DeleteServiceInstanceResponse>> {
//!         Ok(None)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_defaults().with_env_prefix("HERMES").load()?;
//!     let broker = Broker::builder()
//!         .catalog(sample_catalog())
//!         .instances(MyInstances);
//!
//!     hermes::serve(&config, broker).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → RequestId → Tracing → ApiVersion → ApiInfoLocation → OriginatingIdentity
//!                                                                        ↓
//! Response ← status engine ← broker trait ← catalog resolver ← Router ←──┘
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assemble;

pub use assemble::{pipeline_settings, serve, server_config, telemetry_config, HermesError};

// Re-export core types
pub use hermes_core as core;

// Re-export server types
pub use hermes_server as server;

// Re-export middleware types
pub use hermes_middleware as middleware;

// Re-export configuration types
pub use hermes_config as config;

// Re-export telemetry types
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hermes::prelude::*;
///
/// let response = LastOperationResponse::new(OperationState::InProgress);
/// assert_eq!(response.state, OperationState::InProgress);
/// ```
pub mod prelude {
    pub use hermes_core::{
        BindingStatus, BrokerError, BrokerResult, Catalog, CatalogService, Context,
        CreateServiceInstanceBindingRequest, CreateServiceInstanceBindingResponse,
        CreateServiceInstanceRequest, CreateServiceInstanceResponse,
        DeleteServiceInstanceBindingRequest, DeleteServiceInstanceBindingResponse,
        DeleteServiceInstanceRequest, DeleteServiceInstanceResponse,
        GetLastServiceBindingOperationRequest, GetLastServiceOperationRequest,
        GetServiceInstanceBindingRequest, GetServiceInstanceBindingResponse,
        GetServiceInstanceRequest, GetServiceInstanceResponse, LastOperationResponse,
        OperationState, Plan, Properties, RequestContext, ServiceDefinition,
        ServiceInstanceBindingService, ServiceInstanceService, UpdateServiceInstanceRequest,
        UpdateServiceInstanceResponse,
    };

    pub use hermes_config::HermesConfig;

    pub use hermes_server::{Broker, BrokerBuilder, Server, ServerConfig, ShutdownSignal};
}

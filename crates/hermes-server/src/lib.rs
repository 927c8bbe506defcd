//! # Hermes Server
//!
//! The HTTP face of the Hermes service broker layer.
//!
//! - [`Broker`] - pipeline, routes and controllers behind one in-memory
//!   `handle(request) -> response` entry point
//! - [`router`] - the `/v2` route table, optionally prefixed by a base path
//!   and a platform instance id
//! - [`catalog`] - catalog responses with `ETag` / `If-None-Match`
//! - [`Server`] - hyper listener with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use hermes_core::fixtures::sample_catalog;
//! # use hermes_core::{BrokerResult, CreateServiceInstanceRequest, CreateServiceInstanceResponse,
//! #     DeleteServiceInstanceRequest, DeleteServiceInstanceResponse, ServiceInstanceService};
//! use hermes_server::Broker;
//! use http_body_util::Full;
//!
//! # struct Instances;
//! # #[async_trait::async_trait]
//! # impl ServiceInstanceService for Instances {
//! #     async fn create_service_instance(&self, _: CreateServiceInstanceRequest)
//! #         -> BrokerResult<Option<CreateServiceInstanceResponse>> { Ok(None) }
//! #     async fn delete_service_instance(&self, _: DeleteServiceInstanceRequest)
//! #         -> BrokerResult<Option<DeleteServiceInstanceResponse>> { Ok(None) }
//! # }
//! # tokio_test::block_on(async {
//! let broker = Broker::builder()
//!     .catalog(sample_catalog())
//!     .instances(Instances)
//!     .build()
//!     .unwrap();
//!
//! let request = http::Request::get("/v2/catalog")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//! let response = broker.handle(request).await;
//! assert_eq!(response.status(), 200);
//! assert!(response.headers().contains_key("etag"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod broker;
pub mod catalog;
mod config;
mod controller;
mod error;
pub mod router;
mod server;
mod shutdown;

pub use broker::{Broker, BrokerBuilder};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use controller::OperationQuery;
pub use error::ServerError;
pub use router::{Endpoint, RouteMatch, RouteOutcome, Router};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};

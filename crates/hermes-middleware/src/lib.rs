//! # Hermes Middleware
//!
//! Middleware pipeline for the Hermes service broker layer.
//!
//! Every request passes through the same fixed stages before routing and
//! the broker operation run:
//!
//! ```text
//! Request → RequestId → Tracing → ApiVersion → ApiInfoLocation
//!                                      │
//!                                      └─ 400/412 error document
//!
//!         → OriginatingIdentity → Operation
//!                  │
//!                  └─ 400 error document
//! ```
//!
//! | Stage | Middleware           | Purpose                                          |
//! |-------|----------------------|--------------------------------------------------|
//! | 1     | Request ID           | Capture the platform request id, echo it back    |
//! | 2     | Tracing              | `broker_request` span with method, path, status  |
//! | 3     | API Version          | Reject missing or mismatched version headers     |
//! | 4     | API Info Location    | Capture `X-Api-Info-Location`                    |
//! | 5     | Originating Identity | Decode `X-Broker-API-Originating-Identity`       |
//!
//! ## Example
//!
//! ```
//! use hermes_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 5);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[2].name(), "api_version");
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineSettings, Stage};
pub use types::{Request, Response, ResponseExt};

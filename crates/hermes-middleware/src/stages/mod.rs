//! Broker middleware stages.
//!
//! 1. [`request_id`] - Capture and echo the platform request id
//! 2. [`tracing`] - Open the request span
//! 3. [`api_version`] - API version gate
//! 4. [`api_info`] - Capture the API info location
//! 5. [`identity`] - Decode the originating identity

pub mod api_info;
pub mod api_version;
pub mod identity;
pub mod request_id;
pub mod tracing;

pub use self::api_info::ApiInfoLocationMiddleware;
pub use self::api_version::ApiVersionMiddleware;
pub use self::identity::OriginatingIdentityMiddleware;
pub use self::request_id::RequestIdMiddleware;
pub use self::tracing::TracingMiddleware;

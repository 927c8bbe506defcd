//! Fixed-order middleware pipeline.
//!
//! Every broker request flows through the same stages, in this order:
//!
//! 1. **Request ID** - Capture the platform's request id and echo it back
//! 2. **Tracing** - Open the `broker_request` span
//! 3. **API Version** - Reject requests whose version header does not match
//! 4. **API Info Location** - Capture the platform's API info location
//! 5. **Originating Identity** - Decode the originating identity header
//!
//! The terminal handler (routing and the broker operation) runs after the
//! last stage. The order is fixed by [`Pipeline::standard`]; the builder
//! exists for tests and custom assemblies.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{
    ApiInfoLocationMiddleware, ApiVersionMiddleware, OriginatingIdentityMiddleware,
    RequestIdMiddleware, TracingMiddleware,
};
use crate::types::{Request, Response};
use hermes_core::ExpectedApiVersion;
use http::HeaderName;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Header names and the version expectation used by the standard stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Service name recorded on the request span.
    pub service_name: String,
    /// API version header.
    pub version_header: HeaderName,
    /// Accepted API version; `None` disables the gate.
    pub expected_version: Option<ExpectedApiVersion>,
    /// API info location header.
    pub api_info_location_header: HeaderName,
    /// Originating identity header.
    pub originating_identity_header: HeaderName,
    /// Request identity header.
    pub request_identity_header: HeaderName,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            service_name: "hermes".to_string(),
            version_header: HeaderName::from_static("x-broker-api-version"),
            expected_version: None,
            api_info_location_header: HeaderName::from_static("x-api-info-location"),
            originating_identity_header: HeaderName::from_static(
                "x-broker-api-originating-identity",
            ),
            request_identity_header: HeaderName::from_static("x-broker-api-request-identity"),
        }
    }
}

/// The middleware pipeline.
///
/// # Example
///
/// ```
/// use hermes_middleware::pipeline::{Pipeline, PipelineSettings};
///
/// let pipeline = Pipeline::standard(&PipelineSettings::default());
/// assert_eq!(
///     pipeline.stage_names(),
///     vec!["request_id", "tracing", "api_version", "api_info_location", "originating_identity"]
/// );
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates the standard broker pipeline.
    #[must_use]
    pub fn standard(settings: &PipelineSettings) -> Self {
        Self::builder()
            .add_stage(RequestIdMiddleware::new(settings.request_identity_header.clone()))
            .add_stage(TracingMiddleware::new(settings.service_name.clone()))
            .add_stage(ApiVersionMiddleware::new(
                settings.version_header.clone(),
                settings.expected_version.clone(),
            ))
            .add_stage(ApiInfoLocationMiddleware::new(
                settings.api_info_location_header.clone(),
            ))
            .add_stage(OriginatingIdentityMiddleware::new(
                settings.originating_identity_header.clone(),
            ))
            .build()
    }

    /// Processes a request through every stage, then the handler.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline { stages: self.stages }
    }
}

/// The stages of the standard pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: request id capture and echo
    RequestId = 1,
    /// Stage 2: request span
    Tracing = 2,
    /// Stage 3: API version gate
    ApiVersion = 3,
    /// Stage 4: API info location capture
    ApiInfoLocation = 4,
    /// Stage 5: originating identity decoding
    OriginatingIdentity = 5,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::Tracing => "tracing",
            Self::ApiVersion => "api_version",
            Self::ApiInfoLocation => "api_info_location",
            Self::OriginatingIdentity => "originating_identity",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::RequestId,
            Self::Tracing,
            Self::ApiVersion,
            Self::ApiInfoLocation,
            Self::OriginatingIdentity,
        ]
    }
}

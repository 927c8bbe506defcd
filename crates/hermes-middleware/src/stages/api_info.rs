//! API info location middleware.
//!
//! Captures the `X-Api-Info-Location` header, which points at the
//! platform's API info endpoint, for the request scope.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderName;

/// Default API info location header.
pub const API_INFO_LOCATION_HEADER: &str = "x-api-info-location";

/// Middleware that records the API info location.
#[derive(Debug, Clone)]
pub struct ApiInfoLocationMiddleware {
    header: HeaderName,
}

impl ApiInfoLocationMiddleware {
    /// Creates the middleware for the given header.
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for ApiInfoLocationMiddleware {
    fn default() -> Self {
        Self::new(HeaderName::from_static(API_INFO_LOCATION_HEADER))
    }
}

impl Middleware for ApiInfoLocationMiddleware {
    fn name(&self) -> &'static str {
        "api_info_location"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(value) = request.headers().get(&self.header) {
                ctx.set_api_info_location(String::from_utf8_lossy(value.as_bytes()).into_owned());
            }
            next.run(ctx, request).await
        })
    }
}

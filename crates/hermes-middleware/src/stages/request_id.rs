//! Request id middleware.
//!
//! Platforms may send an opaque request id in the
//! `X-Broker-API-Request-Identity` header. When present it is captured
//! verbatim for the request scope and echoed back on the response. When
//! absent nothing is generated and nothing is echoed.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderName;

/// Default request id header.
pub const REQUEST_IDENTITY_HEADER: &str = "x-broker-api-request-identity";

/// Middleware that captures and echoes the platform's request id.
#[derive(Debug, Clone)]
pub struct RequestIdMiddleware {
    header: HeaderName,
}

impl RequestIdMiddleware {
    /// Creates the middleware for the given header.
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self::new(HeaderName::from_static(REQUEST_IDENTITY_HEADER))
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let incoming = request.headers().get(&self.header).cloned();

            if let Some(value) = &incoming {
                ctx.set_request_id(String::from_utf8_lossy(value.as_bytes()).into_owned());
            }

            let mut response = next.run(ctx, request).await;

            if let Some(value) = incoming {
                response.headers_mut().insert(self.header.clone(), value);
            }

            response
        })
    }
}

//! Tracing middleware.
//!
//! Opens a `broker_request` span around the rest of the pipeline and the
//! broker operation, then records the final status on it.
//!
//! ## Span Fields
//!
//! - `service` - configured service name
//! - `method` - HTTP method
//! - `path` - request path
//! - `request_id` - platform request id, when one was sent
//! - `status` - response status (recorded on completion)

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use tracing::Instrument;

/// Middleware that wraps each request in a tracing span.
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    service_name: String,
}

impl TracingMiddleware {
    /// Creates a new tracing middleware.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Returns the service name recorded on spans.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new("hermes")
    }
}

impl Middleware for TracingMiddleware {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let span = tracing::info_span!(
            "broker_request",
            service = %self.service_name,
            method = %request.method(),
            path = %request.uri().path(),
            request_id = ctx.request_id().unwrap_or_default(),
            status = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let response = next.run(ctx, request).await;
                let status = response.status().as_u16();

                tracing::Span::current().record("status", status);
                tracing::debug!(
                    status,
                    elapsed_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "request completed"
                );

                response
            }
            .instrument(span),
        )
    }
}

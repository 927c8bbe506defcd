//! Originating identity middleware.
//!
//! Decodes the `X-Broker-API-Originating-Identity` header into a typed
//! [`Context`](hermes_core::Context). An absent header is not an error; a
//! header that cannot be decoded answers 400 with an error document and the
//! broker is never invoked.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use hermes_core::decode_originating_identity;
use http::HeaderName;

/// Default originating identity header.
pub const ORIGINATING_IDENTITY_HEADER: &str = "x-broker-api-originating-identity";

/// Middleware that decodes the originating identity header.
#[derive(Debug, Clone)]
pub struct OriginatingIdentityMiddleware {
    header: HeaderName,
}

impl OriginatingIdentityMiddleware {
    /// Creates the middleware for the given header.
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for OriginatingIdentityMiddleware {
    fn default() -> Self {
        Self::new(HeaderName::from_static(ORIGINATING_IDENTITY_HEADER))
    }
}

impl Middleware for OriginatingIdentityMiddleware {
    fn name(&self) -> &'static str {
        "originating_identity"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(value) = request.headers().get(&self.header) {
                let value = String::from_utf8_lossy(value.as_bytes());
                match decode_originating_identity(&value) {
                    Ok(identity) => {
                        tracing::debug!(
                            platform = identity.platform(),
                            "decoded originating identity"
                        );
                        ctx.set_originating_identity(identity);
                    }
                    Err(error) => {
                        tracing::warn!(header = %self.header, "rejected request: {error}");
                        return Response::broker_error(error.status_code(), &error);
                    }
                }
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hermes_core::fixtures;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::{BodyExt, Full};

    fn request(identity: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/v2/service_instances/i");
        if let Some(identity) = identity {
            builder = builder.header(ORIGINATING_IDENTITY_HEADER, identity);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn handler() -> Next<'static> {
        Next::handler(|_ctx, _req| Box::pin(async { Response::empty(StatusCode::OK) }))
    }

    #[tokio::test]
    async fn test_decodes_identity() {
        let middleware = OriginatingIdentityMiddleware::default();
        let mut ctx = MiddlewareContext::new();
        let header = fixtures::cloud_foundry_context().to_header_value();

        let response = middleware.process(&mut ctx, request(Some(&header)), handler()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let identity = ctx.originating_identity().unwrap();
        assert_eq!(identity.platform(), "cloudfoundry");
        assert_eq!(identity.get_str("user_id"), Some("user-guid"));
    }

    #[tokio::test]
    async fn test_absent_header_is_fine() {
        let middleware = OriginatingIdentityMiddleware::default();
        let mut ctx = MiddlewareContext::new();

        let response = middleware.process(&mut ctx, request(None), handler()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(ctx.originating_identity().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_header_is_rejected() {
        let middleware = OriginatingIdentityMiddleware::default();
        let mut ctx = MiddlewareContext::new();

        let response = middleware.process(&mut ctx, request(Some("cloudfoundry")), handler()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["description"].as_str().unwrap().contains("no properties supplied"));
    }
}

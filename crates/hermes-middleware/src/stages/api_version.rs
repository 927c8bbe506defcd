//! API version gate.
//!
//! Rejects a request before anything else runs when its version header does
//! not satisfy the configured expectation. A rejected request never reaches
//! the broker.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use hermes_core::{check_api_version, ExpectedApiVersion};
use http::HeaderName;

/// Middleware enforcing the configured API version.
#[derive(Debug, Clone)]
pub struct ApiVersionMiddleware {
    header: HeaderName,
    expected: Option<ExpectedApiVersion>,
}

impl ApiVersionMiddleware {
    /// Creates the gate; `None` lets every request through.
    #[must_use]
    pub fn new(header: HeaderName, expected: Option<ExpectedApiVersion>) -> Self {
        Self { header, expected }
    }
}

impl Middleware for ApiVersionMiddleware {
    fn name(&self) -> &'static str {
        "api_version"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let provided = request
                .headers()
                .get(&self.header)
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

            if let Err(error) = check_api_version(
                self.header.as_str(),
                self.expected.as_ref(),
                provided.as_deref(),
            ) {
                tracing::warn!(
                    header = %self.header,
                    provided = provided.as_deref().unwrap_or("<absent>"),
                    "rejected request: {error}"
                );
                return Response::broker_error(error.status_code(), &error);
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::{BodyExt, Full};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const HEADER: &str = "x-broker-api-version";

    fn request(version: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/v2/catalog");
        if let Some(version) = version {
            builder = builder.header(HEADER, version);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn run(expected: Option<&str>, provided: Option<&str>) -> (Response, bool) {
        let middleware = ApiVersionMiddleware::new(
            HeaderName::from_static(HEADER),
            expected.map(ExpectedApiVersion::parse),
        );
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();
        let next = Next::handler(move |_ctx, _req| {
            flag.store(true, Ordering::SeqCst);
            Box::pin(async { Response::empty(StatusCode::OK) })
        });

        let mut ctx = MiddlewareContext::new();
        let response = middleware.process(&mut ctx, request(provided), next).await;
        (response, reached.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_unconfigured_passes() {
        let (response, reached) = run(None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(reached);
    }

    #[tokio::test]
    async fn test_wildcard_passes() {
        let (response, reached) = run(Some("*"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(reached);
    }

    #[tokio::test]
    async fn test_matching_version_passes() {
        let (response, _) = run(Some("2.14"), Some("2.14")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let (response, reached) = run(Some("2.14"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!reached);
    }

    #[tokio::test]
    async fn test_mismatch_is_rejected_with_both_versions() {
        let (response, reached) = run(Some("2.14"), Some("2.13")).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        assert!(!reached);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let description = body["description"].as_str().unwrap();
        assert!(description.contains("2.14"));
        assert!(description.contains("2.13"));
    }
}

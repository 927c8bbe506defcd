//! End-to-end pipeline integration tests.
//!
//! These tests run the standard five-stage pipeline against a terminal
//! handler that records the request scope it was given:
//!
//! 1. Request ID - Capture and echo the platform request id
//! 2. Tracing - Open the request span
//! 3. API Version - Gate on the version header
//! 4. API Info Location - Capture the API info location
//! 5. Originating Identity - Decode the identity header

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use hermes_core::fixtures::{cloud_foundry_context, kubernetes_context};
use hermes_core::{ExpectedApiVersion, RequestContext};
use hermes_middleware::{
    pipeline::{Pipeline, PipelineSettings, Stage},
    BoxFuture, MiddlewareContext, Request, Response, ResponseExt,
};
use http::{Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};

type Captured = Arc<Mutex<Option<RequestContext>>>;

fn make_request(headers: &[(&str, &str)]) -> Request {
    let mut builder = HttpRequest::builder()
        .method("PUT")
        .uri("/v2/service_instances/instance-1");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

/// Runs `request` through `pipeline`, capturing the scope the handler saw.
async fn run(pipeline: &Pipeline, request: Request) -> (Response, Option<RequestContext>) {
    let captured: Captured = Arc::default();
    let sink = Arc::clone(&captured);

    let response = pipeline
        .process(MiddlewareContext::new(), request, move |ctx, _request| {
            let scope = ctx.request_context(Some("platform-1".to_string()));
            *sink.lock().unwrap() = Some(scope);
            Box::pin(async move { Response::json(StatusCode::CREATED, &json!({})) })
                as BoxFuture<'static, Response>
        })
        .await;

    let scope = captured.lock().unwrap().take();
    (response, scope)
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn versioned(version: &str) -> Pipeline {
    Pipeline::standard(&PipelineSettings {
        expected_version: Some(ExpectedApiVersion::parse(version)),
        ..PipelineSettings::default()
    })
}

// ============================================================================
// Stage ordering
// ============================================================================

#[test]
fn test_standard_stage_order() {
    let pipeline = Pipeline::standard(&PipelineSettings::default());
    let expected: Vec<&str> = Stage::all().iter().map(|stage| stage.name()).collect();

    assert_eq!(pipeline.stage_count(), 5);
    assert_eq!(pipeline.stage_names(), expected);
}

// ============================================================================
// Full pipeline
// ============================================================================

#[tokio::test]
async fn test_all_headers_reach_the_handler() {
    let pipeline = versioned("2.14");
    let identity = cloud_foundry_context().to_header_value();
    let request = make_request(&[
        ("X-Broker-API-Version", "2.14"),
        ("X-Broker-API-Request-Identity", "req-7"),
        ("X-Api-Info-Location", "api.example.com/v2/info"),
        ("X-Broker-API-Originating-Identity", identity.as_str()),
    ]);

    let (response, scope) = run(&pipeline, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("x-broker-api-request-identity").unwrap(), "req-7");

    let scope = scope.unwrap();
    assert_eq!(scope.platform_instance_id(), Some("platform-1"));
    assert_eq!(scope.request_id(), Some("req-7"));
    assert_eq!(scope.api_info_location(), Some("api.example.com/v2/info"));
    assert_eq!(scope.originating_identity(), Some(&cloud_foundry_context()));
}

#[tokio::test]
async fn test_no_headers_without_gate() {
    let pipeline = Pipeline::standard(&PipelineSettings::default());
    let (response, scope) = run(&pipeline, make_request(&[])).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get("x-broker-api-request-identity").is_none());

    let scope = scope.unwrap();
    assert!(scope.request_id().is_none());
    assert!(scope.api_info_location().is_none());
    assert!(scope.originating_identity().is_none());
}

#[tokio::test]
async fn test_version_mismatch_short_circuits() {
    let pipeline = versioned("2.14");
    let request = make_request(&[
        ("X-Broker-API-Version", "2.13"),
        ("X-Broker-API-Request-Identity", "req-8"),
    ]);

    let (response, scope) = run(&pipeline, request).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert!(scope.is_none());

    // The request id stage runs before the gate and still echoes.
    assert_eq!(response.headers().get("x-broker-api-request-identity").unwrap(), "req-8");

    let body = body_json(response).await;
    let description = body["description"].as_str().unwrap();
    assert!(description.contains("2.14"));
    assert!(description.contains("2.13"));
}

#[tokio::test]
async fn test_missing_version_is_bad_request() {
    let pipeline = versioned("2.14");
    let (response, scope) = run(&pipeline, make_request(&[])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(scope.is_none());
}

#[tokio::test]
async fn test_wildcard_version_accepts_anything() {
    let pipeline = versioned("*");

    let (response, _) = run(&pipeline, make_request(&[])).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let (response, _) = run(&pipeline, make_request(&[("X-Broker-API-Version", "1.0")])).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_kubernetes_identity_is_decoded() {
    let pipeline = Pipeline::standard(&PipelineSettings::default());
    let identity = kubernetes_context().to_header_value();
    let request = make_request(&[("X-Broker-API-Originating-Identity", identity.as_str())]);

    let (response, scope) = run(&pipeline, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let decoded = scope.unwrap().originating_identity().cloned().unwrap();
    assert_eq!(decoded.platform(), "kubernetes");
}

#[tokio::test]
async fn test_invalid_identity_is_rejected() {
    let pipeline = Pipeline::standard(&PipelineSettings::default());

    for header in ["cloudfoundry", "cloudfoundry %%%", "cloudfoundry bm90IGpzb24="] {
        let request = make_request(&[("X-Broker-API-Originating-Identity", header)]);
        let (response, scope) = run(&pipeline, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{header}");
        assert!(scope.is_none());
        let body = body_json(response).await;
        assert!(body["description"]
            .as_str()
            .unwrap()
            .starts_with("Invalid originating identity header"));
    }
}

#[tokio::test]
async fn test_custom_header_names() {
    let settings = PipelineSettings {
        request_identity_header: http::HeaderName::from_static("x-correlation-id"),
        api_info_location_header: http::HeaderName::from_static("x-info"),
        ..PipelineSettings::default()
    };
    let pipeline = Pipeline::standard(&settings);
    let request = make_request(&[("X-Correlation-Id", "corr-1"), ("X-Info", "info.example.com")]);

    let (response, scope) = run(&pipeline, request).await;
    assert_eq!(response.headers().get("x-correlation-id").unwrap(), "corr-1");

    let scope = scope.unwrap();
    assert_eq!(scope.request_id(), Some("corr-1"));
    assert_eq!(scope.api_info_location(), Some("info.example.com"));
}

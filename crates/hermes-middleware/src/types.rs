//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use hermes_core::BrokerError;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Content type of every broker JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Extension trait for building broker responses.
pub trait ResponseExt {
    /// Creates a JSON response with the given status.
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Response;

    /// Creates a broker error document response.
    fn broker_error(status: StatusCode, error: &BrokerError) -> Response;

    /// Creates a response without a body.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                let mut response = http::Response::new(Full::new(Bytes::from(bytes)));
                *response.status_mut() = status;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                response
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::broker_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &BrokerError::internal("failed to serialize response body"),
                )
            }
        }
    }

    fn broker_error(status: StatusCode, error: &BrokerError) -> Response {
        let message = error.to_error_message();
        let bytes = serde_json::to_vec(&message).unwrap_or_default();
        let mut response = http::Response::new(Full::new(Bytes::from(bytes)));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }
}

//! Catalog endpoint with conditional caching.
//!
//! The catalog is served with a strong `ETag` derived from its JSON wire form.
//! A request whose `If-None-Match` matches the current tag gets `304 Not
//! Modified` with the tag and an empty body. Nothing is cached between
//! requests; the tag is recomputed from whatever the catalog source returns.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use hermes_core::{BrokerError, Catalog};
use hermes_middleware::types::JSON_CONTENT_TYPE;
use hermes_middleware::Response;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use sha2::{Digest, Sha256};

/// Computes the strong entity tag for a serialized catalog.
///
/// ```rust
/// use hermes_server::catalog::catalog_etag;
///
/// let tag = catalog_etag(br#"{"services":[]}"#);
/// assert!(tag.starts_with('"') && tag.ends_with('"'));
/// assert_eq!(tag, catalog_etag(br#"{"services":[]}"#));
/// ```
#[must_use]
pub fn catalog_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", URL_SAFE_NO_PAD.encode(digest))
}

/// Returns whether an `If-None-Match` value matches `etag`.
///
/// Accepts `*`, a single tag, or a comma-separated list. Weak tags
/// (`W/"..."`) compare by their opaque value.
#[must_use]
pub fn if_none_match_matches(if_none_match: &str, etag: &str) -> bool {
    let etag = strip_weak(etag);

    if_none_match
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| candidate == "*" || strip_weak(candidate) == etag)
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Builds the catalog response for the given request headers.
///
/// # Errors
///
/// Returns [`BrokerError::Internal`] if the catalog cannot be serialized.
pub fn catalog_response(catalog: &Catalog, headers: &HeaderMap) -> Result<Response, BrokerError> {
    let body = serde_json::to_vec(catalog)
        .map_err(|e| BrokerError::internal_with_source("failed to serialize catalog", e))?;
    let etag = catalog_etag(&body);

    let not_modified = headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| if_none_match_matches(value, &etag));

    let (status, body) = if not_modified {
        tracing::debug!(etag = %etag, "catalog not modified");
        (StatusCode::NOT_MODIFIED, Bytes::new())
    } else {
        (StatusCode::OK, Bytes::from(body))
    };

    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;

    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    if status == StatusCode::OK {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures::sample_catalog;
    use http_body_util::BodyExt;
    use proptest::prelude::*;

    async fn body_bytes(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn current_etag() -> String {
        catalog_etag(&serde_json::to_vec(&sample_catalog()).unwrap())
    }

    #[test]
    fn test_etag_is_stable_and_content_derived() {
        let a = catalog_etag(b"one");
        assert_eq!(a, catalog_etag(b"one"));
        assert_ne!(a, catalog_etag(b"two"));
        assert!(!a.contains('='));
    }

    #[test]
    fn test_if_none_match_forms() {
        let etag = "\"abc\"";
        assert!(if_none_match_matches("\"abc\"", etag));
        assert!(if_none_match_matches("*", etag));
        assert!(if_none_match_matches("\"x\", \"abc\"", etag));
        assert!(if_none_match_matches("W/\"abc\"", etag));
        assert!(!if_none_match_matches("\"abd\"", etag));
        assert!(!if_none_match_matches("abc", etag));
        assert!(!if_none_match_matches("", etag));
    }

    #[tokio::test]
    async fn test_catalog_without_condition() {
        let response = catalog_response(&sample_catalog(), &HeaderMap::new()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ETAG).unwrap().to_str().unwrap(),
            current_etag()
        );

        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["services"].is_array());
    }

    #[tokio::test]
    async fn test_catalog_not_modified() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_str(&current_etag()).unwrap(),
        );

        let response = catalog_response(&sample_catalog(), &headers).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            response.headers().get(header::ETAG).unwrap().to_str().unwrap(),
            current_etag()
        );
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_stale_tag() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"stale\""));

        let response = catalog_response(&sample_catalog(), &headers).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!body_bytes(response).await.is_empty());
    }

    proptest! {
        #[test]
        fn prop_listed_etag_matches(
            body in proptest::collection::vec(any::<u8>(), 0..64),
            before in proptest::collection::vec("\"[a-z0-9]{1,8}\"", 0..3),
            after in proptest::collection::vec("\"[a-z0-9]{1,8}\"", 0..3),
            weak: bool,
        ) {
            let etag = catalog_etag(&body);
            let listed = if weak { format!("W/{etag}") } else { etag.clone() };
            let header = before
                .iter()
                .chain(std::iter::once(&listed))
                .chain(after.iter())
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");

            prop_assert!(if_none_match_matches(&header, &etag));
        }

        #[test]
        fn prop_other_tags_never_match(
            body in proptest::collection::vec(any::<u8>(), 0..64),
            tags in proptest::collection::vec("\"[a-z0-9]{1,8}\"", 0..4),
        ) {
            // Generated tags are at most 10 chars; a catalog tag is 45.
            let etag = catalog_etag(&body);
            prop_assert!(!if_none_match_matches(&tags.join(", "), &etag));
        }

        #[test]
        fn prop_wildcard_matches_any_catalog(
            body in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            prop_assert!(if_none_match_matches("*", &catalog_etag(&body)));
        }
    }
}

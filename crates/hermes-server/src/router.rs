//! Request routing and path matching.
//!
//! Maps an incoming method and path to a broker [`Endpoint`]. Path templates
//! use `{param}` segments; the broker routes capture `instance_id`,
//! `binding_id` and, on the platform-prefixed variants,
//! `platform_instance_id`.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::OperationKind;
//! use hermes_server::router::{Endpoint, RouteOutcome, Router};
//! use http::Method;
//!
//! let router = Router::broker(None);
//!
//! let outcome = router.match_route(&Method::PUT, "/v2/service_instances/abc");
//! let RouteOutcome::Matched(m) = outcome else {
//!     panic!("expected a match");
//! };
//! assert_eq!(m.endpoint(), Endpoint::Operation(OperationKind::CreateInstance));
//! assert_eq!(m.param("instance_id"), Some("abc"));
//! assert_eq!(m.param("platform_instance_id"), None);
//! ```

use std::collections::HashMap;
use std::fmt;

use hermes_core::OperationKind;
use http::Method;

/// Path parameter holding the service instance id.
pub const INSTANCE_ID: &str = "instance_id";

/// Path parameter holding the binding id.
pub const BINDING_ID: &str = "binding_id";

/// Path parameter holding the platform instance id prefix.
pub const PLATFORM_INSTANCE_ID: &str = "platform_instance_id";

/// What a route leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /v2/catalog`.
    Catalog,
    /// One of the instance or binding operations.
    Operation(OperationKind),
}

impl Endpoint {
    /// Name used in logs and metric labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Operation(kind) => kind.name(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    endpoint: Endpoint,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(endpoint: Endpoint, params: HashMap<String, String>) -> Self {
        Self { endpoint, params }
    }

    /// Returns the matched endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the platform instance id, if the prefixed route matched.
    #[must_use]
    pub fn platform_instance_id(&self) -> Option<&str> {
        self.param(PLATFORM_INSTANCE_ID)
    }
}

/// Result of routing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A route matched both path and method.
    Matched(RouteMatch),
    /// The path is known but not for this method; carries the allowed methods.
    MethodNotAllowed(Vec<Method>),
    /// No route has this path.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    endpoint: Endpoint,
}

impl Route {
    fn new(method: Method, pattern: &str, endpoint: Endpoint) -> Self {
        Self {
            method,
            segments: Self::parse_segments(pattern),
            endpoint,
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn match_path(&self, path_segments: &[&str]) -> Option<HashMap<String, String>> {
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }

        Some(params)
    }
}

/// The broker's routes, relative to `/v2`.
const BROKER_ROUTES: &[(Method, &str, Endpoint)] = &[
    (Method::GET, "/v2/catalog", Endpoint::Catalog),
    (
        Method::PUT,
        "/v2/service_instances/{instance_id}",
        Endpoint::Operation(OperationKind::CreateInstance),
    ),
    (
        Method::PATCH,
        "/v2/service_instances/{instance_id}",
        Endpoint::Operation(OperationKind::UpdateInstance),
    ),
    (
        Method::DELETE,
        "/v2/service_instances/{instance_id}",
        Endpoint::Operation(OperationKind::DeleteInstance),
    ),
    (
        Method::GET,
        "/v2/service_instances/{instance_id}",
        Endpoint::Operation(OperationKind::GetInstance),
    ),
    (
        Method::GET,
        "/v2/service_instances/{instance_id}/last_operation",
        Endpoint::Operation(OperationKind::InstanceLastOperation),
    ),
    (
        Method::PUT,
        "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
        Endpoint::Operation(OperationKind::CreateBinding),
    ),
    (
        Method::GET,
        "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
        Endpoint::Operation(OperationKind::GetBinding),
    ),
    (
        Method::DELETE,
        "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
        Endpoint::Operation(OperationKind::DeleteBinding),
    ),
    (
        Method::GET,
        "/v2/service_instances/{instance_id}/service_bindings/{binding_id}/last_operation",
        Endpoint::Operation(OperationKind::BindingLastOperation),
    ),
];

/// HTTP request router.
///
/// Routes are checked in registration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates a router with every broker route, optionally under `base_path`.
    ///
    /// Each route is registered twice: as-is and behind a
    /// `{platform_instance_id}` segment.
    ///
    /// ```rust
    /// use hermes_server::router::{Endpoint, RouteOutcome, Router};
    /// use http::Method;
    ///
    /// let router = Router::broker(Some("/broker"));
    /// assert_eq!(router.route_count(), 20);
    ///
    /// let outcome = router.match_route(&Method::GET, "/broker/cf-east/v2/catalog");
    /// let RouteOutcome::Matched(m) = outcome else {
    ///     panic!("expected a match");
    /// };
    /// assert_eq!(m.endpoint(), Endpoint::Catalog);
    /// assert_eq!(m.platform_instance_id(), Some("cf-east"));
    ///
    /// assert_eq!(router.match_route(&Method::GET, "/v2/catalog"), RouteOutcome::NotFound);
    /// ```
    #[must_use]
    pub fn broker(base_path: Option<&str>) -> Self {
        let base = base_path.unwrap_or_default().trim_end_matches('/');
        let mut router = Self::new();

        for (method, pattern, endpoint) in BROKER_ROUTES {
            router.add_route(method.clone(), format!("{base}{pattern}"), *endpoint);
        }
        for (method, pattern, endpoint) in BROKER_ROUTES {
            router.add_route(
                method.clone(),
                format!("{base}/{{{PLATFORM_INSTANCE_ID}}}{pattern}"),
                *endpoint,
            );
        }

        router
    }

    /// Adds a route.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, endpoint: Endpoint) {
        self.routes.push(Route::new(method, pattern.as_ref(), endpoint));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a request against the registered routes.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteOutcome {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut allowed = Vec::new();

        for route in &self.routes {
            if let Some(params) = route.match_path(&path_segments) {
                if route.method == *method {
                    return RouteOutcome::Matched(RouteMatch::new(route.endpoint, params));
                }
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
            }
        }

        if allowed.is_empty() {
            RouteOutcome::NotFound
        } else {
            RouteOutcome::MethodNotAllowed(allowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matched(outcome: RouteOutcome) -> RouteMatch {
        match outcome {
            RouteOutcome::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_broker_routes() {
        let router = Router::broker(None);
        assert_eq!(router.route_count(), 20);

        let cases = [
            (Method::GET, "/v2/catalog", Endpoint::Catalog),
            (
                Method::PUT,
                "/v2/service_instances/i",
                Endpoint::Operation(OperationKind::CreateInstance),
            ),
            (
                Method::PATCH,
                "/v2/service_instances/i",
                Endpoint::Operation(OperationKind::UpdateInstance),
            ),
            (
                Method::DELETE,
                "/v2/service_instances/i",
                Endpoint::Operation(OperationKind::DeleteInstance),
            ),
            (
                Method::GET,
                "/v2/service_instances/i",
                Endpoint::Operation(OperationKind::GetInstance),
            ),
            (
                Method::GET,
                "/v2/service_instances/i/last_operation",
                Endpoint::Operation(OperationKind::InstanceLastOperation),
            ),
            (
                Method::PUT,
                "/v2/service_instances/i/service_bindings/b",
                Endpoint::Operation(OperationKind::CreateBinding),
            ),
            (
                Method::GET,
                "/v2/service_instances/i/service_bindings/b",
                Endpoint::Operation(OperationKind::GetBinding),
            ),
            (
                Method::DELETE,
                "/v2/service_instances/i/service_bindings/b",
                Endpoint::Operation(OperationKind::DeleteBinding),
            ),
            (
                Method::GET,
                "/v2/service_instances/i/service_bindings/b/last_operation",
                Endpoint::Operation(OperationKind::BindingLastOperation),
            ),
        ];

        for (method, path, endpoint) in cases {
            let m = matched(router.match_route(&method, path));
            assert_eq!(m.endpoint(), endpoint, "{method} {path}");
        }
    }

    #[test]
    fn test_binding_params() {
        let router = Router::broker(None);
        let m = matched(router.match_route(
            &Method::PUT,
            "/v2/service_instances/inst-1/service_bindings/bind-1",
        ));
        assert_eq!(m.param(INSTANCE_ID), Some("inst-1"));
        assert_eq!(m.param(BINDING_ID), Some("bind-1"));
        assert_eq!(m.platform_instance_id(), None);
    }

    #[test]
    fn test_platform_prefix() {
        let router = Router::broker(None);
        let m = matched(router.match_route(
            &Method::GET,
            "/platform-1/v2/service_instances/i/last_operation",
        ));
        assert_eq!(m.endpoint(), Endpoint::Operation(OperationKind::InstanceLastOperation));
        assert_eq!(m.platform_instance_id(), Some("platform-1"));
        assert_eq!(m.param(INSTANCE_ID), Some("i"));
    }

    #[test]
    fn test_platform_prefix_does_not_shadow_plain_routes() {
        let router = Router::broker(None);
        let m = matched(router.match_route(&Method::GET, "/v2/service_instances/i/last_operation"));
        assert_eq!(m.platform_instance_id(), None);
    }

    #[test]
    fn test_base_path() {
        let router = Router::broker(Some("/osb/"));
        let m = matched(router.match_route(&Method::GET, "/osb/v2/catalog"));
        assert_eq!(m.endpoint(), Endpoint::Catalog);
        assert_eq!(router.match_route(&Method::GET, "/v2/catalog"), RouteOutcome::NotFound);
    }

    #[test]
    fn test_method_not_allowed() {
        let router = Router::broker(None);
        assert_eq!(
            router.match_route(&Method::POST, "/v2/catalog"),
            RouteOutcome::MethodNotAllowed(vec![Method::GET])
        );

        match router.match_route(&Method::POST, "/v2/service_instances/i") {
            RouteOutcome::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, vec![Method::PUT, Method::PATCH, Method::DELETE, Method::GET]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        let router = Router::broker(None);
        assert_eq!(router.match_route(&Method::GET, "/v2/unknown"), RouteOutcome::NotFound);
        assert_eq!(router.match_route(&Method::GET, "/"), RouteOutcome::NotFound);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let router = Router::broker(None);
        let m = matched(router.match_route(&Method::GET, "/v2/catalog/"));
        assert_eq!(m.endpoint(), Endpoint::Catalog);
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(Endpoint::Catalog.name(), "catalog");
        assert_eq!(
            Endpoint::Operation(OperationKind::DeleteBinding).to_string(),
            "delete_binding"
        );
    }

    proptest! {
        #[test]
        fn prop_binding_ids_are_extracted(
            platform in proptest::option::of("[a-z][a-z0-9-]{0,12}"),
            instance in "[A-Za-z0-9._-]{1,24}",
            binding in "[A-Za-z0-9._-]{1,24}",
        ) {
            prop_assume!(platform.as_deref() != Some("v2"));
            let router = Router::broker(None);
            let prefix = platform.as_ref().map(|p| format!("/{p}")).unwrap_or_default();
            let path =
                format!("{prefix}/v2/service_instances/{instance}/service_bindings/{binding}");

            let m = matched(router.match_route(&Method::DELETE, &path));
            prop_assert_eq!(m.endpoint(), Endpoint::Operation(OperationKind::DeleteBinding));
            prop_assert_eq!(m.param(INSTANCE_ID), Some(instance.as_str()));
            prop_assert_eq!(m.param(BINDING_ID), Some(binding.as_str()));
            prop_assert_eq!(m.platform_instance_id(), platform.as_deref());
        }

        #[test]
        fn prop_unknown_top_level_is_not_found(segment in "[a-z]{1,12}") {
            prop_assume!(segment != "v2");
            let router = Router::broker(None);
            prop_assert_eq!(
                router.match_route(&Method::GET, &format!("/{segment}")),
                RouteOutcome::NotFound
            );
        }
    }
}

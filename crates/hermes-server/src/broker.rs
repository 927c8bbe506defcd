//! The assembled broker.
//!
//! A [`Broker`] owns the middleware pipeline, the route table and the broker
//! services. [`Broker::handle`] answers one request entirely in memory, so
//! the same entry point serves the hyper listener and integration tests.
//!
//! ```text
//! Request → Pipeline (request id, span, version gate, api info, identity)
//!         → Router → catalog | controller → broker service
//!         → status + body
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use hermes_core::status::error_body;
use hermes_core::{
    CatalogService, ErrorMessage, OperationKind, ServiceInstanceBindingService,
    ServiceInstanceService,
};
use hermes_middleware::{
    MiddlewareContext, Pipeline, PipelineSettings, Request, Response, ResponseExt,
};
use hermes_telemetry::{record_operation, InFlightGuard};
use http::header::{HeaderMap, HeaderValue, ALLOW};
use http::{Method, StatusCode};
use http_body_util::BodyExt;

use crate::catalog::catalog_response;
use crate::controller::{self, Call, OperationQuery, Services};
use crate::error::ServerError;
use crate::router::{Endpoint, RouteMatch, RouteOutcome, Router, BINDING_ID, INSTANCE_ID};

/// A protocol-compliant service broker front end.
///
/// Cheap to clone; clones share the same pipeline, routes and services.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    pipeline: Pipeline,
    router: Router,
    services: Services,
}

impl Broker {
    /// Creates a broker builder.
    #[must_use]
    pub fn builder() -> BrokerBuilder {
        BrokerBuilder::new()
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    /// Answers one request.
    pub async fn handle(&self, request: Request) -> Response {
        let inner = Arc::clone(&self.inner);

        self.inner
            .pipeline
            .process(MiddlewareContext::new(), request, move |ctx, request| {
                let ctx = ctx.clone();
                Box::pin(async move { inner.dispatch(ctx, request).await })
            })
            .await
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("stages", &self.inner.pipeline.stage_names())
            .field("routes", &self.inner.router.route_count())
            .field("bindings", &self.inner.services.bindings.is_some())
            .finish()
    }
}

impl BrokerInner {
    async fn dispatch(&self, ctx: MiddlewareContext, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let route = match self.router.match_route(&parts.method, parts.uri.path()) {
            RouteOutcome::Matched(route) => route,
            RouteOutcome::MethodNotAllowed(allowed) => {
                return method_not_allowed(&parts.method, parts.uri.path(), &allowed);
            }
            RouteOutcome::NotFound => {
                tracing::debug!(path = %parts.uri.path(), "no route");
                return Response::json(
                    StatusCode::NOT_FOUND,
                    &ErrorMessage::new(format!("No broker endpoint at {}", parts.uri.path())),
                );
            }
        };

        let endpoint = route.endpoint();
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();

        let response = match endpoint {
            Endpoint::Catalog => self.catalog(&parts.headers).await,
            Endpoint::Operation(kind) => {
                self.operation(kind, &route, parts.uri.query(), body, &ctx).await
            }
        };

        record_operation(endpoint.name(), response.status().as_u16(), started.elapsed());
        response
    }

    async fn operation(
        &self,
        kind: OperationKind,
        route: &RouteMatch,
        query: Option<&str>,
        body: Bytes,
        ctx: &MiddlewareContext,
    ) -> Response {
        let query = match OperationQuery::parse(query) {
            Ok(query) => query,
            Err(err) => return controller::failure(kind, &err),
        };

        let call = Call {
            kind,
            instance_id: route.param(INSTANCE_ID).unwrap_or_default().to_string(),
            binding_id: route.param(BINDING_ID).unwrap_or_default().to_string(),
            query,
            body,
            scope: ctx.request_context(route.platform_instance_id().map(str::to_string)),
        };
        controller::dispatch(&self.services, call).await
    }

    async fn catalog(&self, headers: &HeaderMap) -> Response {
        let result = self
            .services
            .catalog()
            .await
            .and_then(|catalog| catalog_response(&catalog, headers));

        result.unwrap_or_else(|err| {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(error = %err, "catalog unavailable");
            }
            Response::json(status, &error_body(status, &err))
        })
    }
}

fn method_not_allowed(method: &Method, path: &str, allowed: &[Method]) -> Response {
    tracing::debug!(%method, path, "method not allowed");

    let mut response = Response::json(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorMessage::new(format!("Method {method} is not supported at {path}")),
    );
    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Builder for [`Broker`].
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use hermes_core::fixtures::sample_catalog;
/// use hermes_core::{
///     BrokerResult, CreateServiceInstanceRequest, CreateServiceInstanceResponse,
///     DeleteServiceInstanceRequest, DeleteServiceInstanceResponse, ServiceInstanceService,
/// };
/// use hermes_server::Broker;
///
/// struct Instances;
///
/// #[async_trait]
/// impl ServiceInstanceService for Instances {
///     async fn create_service_instance(
///         &self,
///         _request: CreateServiceInstanceRequest,
///     ) -> BrokerResult<Option<CreateServiceInstanceResponse>> {
///         Ok(None)
///     }
///
///     async fn delete_service_instance(
///         &self,
///         _request: DeleteServiceInstanceRequest,
///     ) -> BrokerResult<Option<DeleteServiceInstanceResponse>> {
///         Ok(None)
///     }
/// }
///
/// let broker = Broker::builder()
///     .catalog(sample_catalog())
///     .instances(Instances)
///     .base_path("/broker")
///     .build()
///     .unwrap();
/// assert_eq!(broker.router().route_count(), 20);
/// ```
#[derive(Default)]
pub struct BrokerBuilder {
    catalog: Option<Arc<dyn CatalogService>>,
    instances: Option<Arc<dyn ServiceInstanceService>>,
    bindings: Option<Arc<dyn ServiceInstanceBindingService>>,
    settings: PipelineSettings,
    base_path: Option<String>,
}

impl BrokerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog source. A [`hermes_core::Catalog`] serves itself.
    #[must_use]
    pub fn catalog(mut self, catalog: impl CatalogService) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Sets a shared catalog source.
    #[must_use]
    pub fn catalog_service(mut self, catalog: Arc<dyn CatalogService>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the service instance implementation.
    #[must_use]
    pub fn instances(mut self, instances: impl ServiceInstanceService) -> Self {
        self.instances = Some(Arc::new(instances));
        self
    }

    /// Sets a shared service instance implementation.
    #[must_use]
    pub fn instance_service(mut self, instances: Arc<dyn ServiceInstanceService>) -> Self {
        self.instances = Some(instances);
        self
    }

    /// Sets the binding implementation. Without one, binding operations
    /// answer 501.
    #[must_use]
    pub fn bindings(mut self, bindings: impl ServiceInstanceBindingService) -> Self {
        self.bindings = Some(Arc::new(bindings));
        self
    }

    /// Sets a shared binding implementation.
    #[must_use]
    pub fn binding_service(mut self, bindings: Arc<dyn ServiceInstanceBindingService>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// Sets header names, the expected API version and the span service name.
    #[must_use]
    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Serves every route below `base_path`.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Builds the broker.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingComponent`] without a catalog or an
    /// instance service.
    pub fn build(self) -> Result<Broker, ServerError> {
        let catalog = self
            .catalog
            .ok_or(ServerError::MissingComponent("catalog service"))?;
        let instances = self
            .instances
            .ok_or(ServerError::MissingComponent("service instance service"))?;

        Ok(Broker {
            inner: Arc::new(BrokerInner {
                pipeline: Pipeline::standard(&self.settings),
                router: Router::broker(self.base_path.as_deref()),
                services: Services {
                    catalog,
                    instances,
                    bindings: self.bindings,
                },
            }),
        })
    }
}

/// Rebuilds a request around a collected body.
pub(crate) fn into_pipeline_request(parts: http::request::Parts, body: Bytes) -> Request {
    Request::from_parts(parts, http_body_util::Full::new(body))
}

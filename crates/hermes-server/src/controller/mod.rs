//! Per-operation controllers.
//!
//! A controller turns a routed request into a typed operation request,
//! resolves its catalog entries, calls the broker, and maps the outcome to a
//! status and body. Every failure raised along the way, before or after the
//! broker call, goes through [`failure`].

mod binding;
mod instance;

use std::error::Error as _;
use std::fmt::Write as _;
use std::sync::Arc;

use bytes::Bytes;
use hermes_core::status::{error_body, error_status, success_status, ResponseStatus};
use hermes_core::{
    BrokerError, BrokerResult, Catalog, CatalogService, FieldErrors, OperationKind,
    RequestContext, ResolvedDefinition, ServiceInstanceBindingService, ServiceInstanceService,
};
use hermes_middleware::{Response, ResponseExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Query parameters recognized by broker operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OperationQuery {
    /// Whether the platform accepts an asynchronous answer.
    #[serde(default)]
    pub accepts_incomplete: bool,
    /// Service definition id (delete and last-operation).
    #[serde(default)]
    pub service_id: Option<String>,
    /// Plan id (delete and last-operation).
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Operation token (last-operation).
    #[serde(default)]
    pub operation: Option<String>,
}

impl OperationQuery {
    /// Parses the request query string; unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Validation`] on the `query` field when a
    /// parameter has the wrong shape (e.g. `accepts_incomplete=maybe`).
    pub fn parse(query: Option<&str>) -> BrokerResult<Self> {
        serde_urlencoded::from_str(query.unwrap_or_default()).map_err(|e| {
            let mut errors = FieldErrors::new();
            errors.add("query", e.to_string());
            BrokerError::Validation(errors)
        })
    }

    fn require_ids(&self) -> BrokerResult<(&str, &str)> {
        let mut errors = FieldErrors::new();
        errors.require("service_id", self.service_id.as_deref());
        errors.require("plan_id", self.plan_id.as_deref());
        errors.into_result()?;

        Ok((
            self.service_id.as_deref().unwrap_or_default(),
            self.plan_id.as_deref().unwrap_or_default(),
        ))
    }
}

/// The broker's collaborators, shared by every request.
#[derive(Clone)]
pub(crate) struct Services {
    pub catalog: Arc<dyn CatalogService>,
    pub instances: Arc<dyn ServiceInstanceService>,
    pub bindings: Option<Arc<dyn ServiceInstanceBindingService>>,
}

impl Services {
    /// Fetches the catalog and checks its consistency.
    pub async fn catalog(&self) -> BrokerResult<Catalog> {
        let catalog = self.catalog.get_catalog().await?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub async fn resolve(
        &self,
        service_id: &str,
        plan_id: Option<&str>,
    ) -> BrokerResult<ResolvedDefinition> {
        self.catalog().await?.resolve(service_id, plan_id)
    }

    fn bindings(&self) -> BrokerResult<&dyn ServiceInstanceBindingService> {
        self.bindings.as_deref().ok_or_else(|| {
            BrokerError::operation_not_supported(
                "This service broker does not support service bindings",
            )
        })
    }
}

/// A routed operation call.
#[derive(Debug)]
pub(crate) struct Call {
    pub kind: OperationKind,
    pub instance_id: String,
    pub binding_id: String,
    pub query: OperationQuery,
    pub body: Bytes,
    pub scope: RequestContext,
}

impl Call {
    fn accepts_incomplete(&self) -> bool {
        self.query.accepts_incomplete
    }
}

/// Runs the operation named by `call.kind` and renders its answer.
pub(crate) async fn dispatch(services: &Services, call: Call) -> Response {
    use OperationKind as K;

    let kind = call.kind;
    let result = match kind {
        K::CreateInstance => instance::create(services, call).await,
        K::UpdateInstance => instance::update(services, call).await,
        K::DeleteInstance => instance::delete(services, call).await,
        K::GetInstance => instance::get(services, call).await,
        K::InstanceLastOperation => instance::last_operation(services, call).await,
        K::CreateBinding => binding::create(services, call).await,
        K::GetBinding => binding::get(services, call).await,
        K::DeleteBinding => binding::delete(services, call).await,
        K::BindingLastOperation => binding::last_operation(services, call).await,
    };

    result.unwrap_or_else(|err| failure(kind, &err))
}

/// Reads a JSON request body. An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> BrokerResult<T> {
    let bytes: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(bytes).map_err(|e| BrokerError::malformed_body(e.to_string()))
}

/// Renders a successful broker answer. `None` answers `{}`.
fn respond<R>(kind: OperationKind, response: Option<&R>) -> BrokerResult<Response>
where
    R: ResponseStatus + Serialize,
{
    let status = success_status(kind, response)?;

    Ok(match response {
        Some(response) => Response::json(status, response),
        None => Response::json(status, &serde_json::json!({})),
    })
}

/// Renders a failure raised while handling `kind`.
pub(crate) fn failure(kind: OperationKind, err: &BrokerError) -> Response {
    let status = error_status(kind, err);

    if status.is_server_error() {
        tracing::error!(
            operation = kind.name(),
            status = status.as_u16(),
            error = %err,
            cause = %source_chain(err),
            "operation failed"
        );
    } else {
        tracing::debug!(
            operation = kind.name(),
            status = status.as_u16(),
            error = %err,
            "operation rejected"
        );
    }

    Response::json(status, &error_body(status, err))
}

fn source_chain(err: &BrokerError) -> String {
    let mut chain = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        if !chain.is_empty() {
            chain.push_str(": ");
        }
        let _ = write!(chain, "{cause}");
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_query_defaults() {
        let query = OperationQuery::parse(None).unwrap();
        assert_eq!(query, OperationQuery::default());
        assert!(!query.accepts_incomplete);
    }

    #[test]
    fn test_query_fields() {
        let query = OperationQuery::parse(Some(
            "accepts_incomplete=true&service_id=s&plan_id=p&operation=op%201&other=x",
        ))
        .unwrap();
        assert!(query.accepts_incomplete);
        assert_eq!(query.service_id.as_deref(), Some("s"));
        assert_eq!(query.plan_id.as_deref(), Some("p"));
        assert_eq!(query.operation.as_deref(), Some("op 1"));
    }

    #[test]
    fn test_query_bad_flag() {
        let err = OperationQuery::parse(Some("accepts_incomplete=maybe")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_require_ids_names_every_missing_field() {
        let err = OperationQuery::default().require_ids().unwrap_err();
        let description = err.to_string();
        assert!(description.contains("service_id"));
        assert!(description.contains("plan_id"));
    }

    #[test]
    fn test_parse_body_empty_is_object() {
        let value: serde_json::Value = parse_body(&Bytes::new()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_parse_body_malformed() {
        let err = parse_body::<serde_json::Value>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_source_chain() {
        let err = BrokerError::internal_with_source(
            "database unavailable",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
        );
        assert_eq!(source_chain(&err), "connect timed out");
        assert_eq!(source_chain(&BrokerError::internal("plain")), "");
    }
}

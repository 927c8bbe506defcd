//! Error types for Hermes.
//!
//! This module provides the [`BrokerError`] type, the closed set of failure
//! conditions a broker request can end in. Every failure, whether it was
//! raised by the protocol layer itself or by the broker implementation,
//! is converted into an [`ErrorMessage`] wire document before it reaches
//! the transport.
//!
//! # Default status codes
//!
//! | Failure | Status | `error` code |
//! |---|---|---|
//! | `VersionMissing` | 400 | - |
//! | `VersionMismatch` | 412 | - |
//! | `InvalidIdentity` | 400 | - |
//! | `ServiceDefinitionNotFound` / `PlanNotFound` | 400 | - |
//! | `Validation` / `InvalidParameters` | 400 | - |
//! | `MalformedBody` | 422 | - |
//! | `InstanceExists` / `BindingExists` | 409 | - |
//! | `InstanceNotFound` | 422 | - |
//! | `BindingNotFound` | 404 | - |
//! | `AsyncRequired` | 422 | `AsyncRequired` |
//! | `MaintenanceInfoConflict` | 422 | `MaintenanceInfoConflict` |
//! | `ConcurrencyError` | 422 | `ConcurrencyError` |
//! | `UpdateNotSupported` | 422 | - |
//! | `OperationInProgress` | 202 | - |
//! | `OperationNotSupported` | 501 | - |
//! | `ServiceBrokerUnavailable` | 503 | - |
//! | `Internal` | 500 | - |
//!
//! The operation a failure occurred in can override these defaults; see
//! [`crate::status`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`BrokerError`].
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Stable error code for [`BrokerError::AsyncRequired`].
pub const ASYNC_REQUIRED_CODE: &str = "AsyncRequired";

/// Stable error code for [`BrokerError::MaintenanceInfoConflict`].
pub const MAINTENANCE_INFO_CONFLICT_CODE: &str = "MaintenanceInfoConflict";

/// Stable error code for [`BrokerError::ConcurrencyError`].
pub const CONCURRENCY_ERROR_CODE: &str = "ConcurrencyError";

const ASYNC_REQUIRED_MESSAGE: &str =
    "This service plan requires client support for asynchronous service operations";

const MAINTENANCE_INFO_CONFLICT_MESSAGE: &str =
    "The maintenance information for the requested operation does not match the \
     maintenance information of the service plan";

const CONCURRENCY_ERROR_MESSAGE: &str =
    "Another operation for this service instance is in progress";

/// A failure raised while handling a broker request.
///
/// # Example
///
/// ```
/// use hermes_core::BrokerError;
///
/// let error = BrokerError::instance_exists("instance-1", "service-1");
/// assert_eq!(error.status_code().as_u16(), 409);
/// assert!(error.error_code().is_none());
/// ```
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The API version header was required but not sent.
    #[error("The {header} header is required; expected version {expected}")]
    VersionMissing {
        /// Name of the version header.
        header: String,
        /// Version the broker is configured to accept.
        expected: String,
    },

    /// The API version header did not match the configured version.
    #[error(
        "The broker API version in the request is not supported: \
         expected version={expected}, provided version={provided}"
    )]
    VersionMismatch {
        /// Version the broker is configured to accept.
        expected: String,
        /// Version sent by the platform.
        provided: String,
    },

    /// The originating identity header could not be decoded.
    #[error("Invalid originating identity header: {message}")]
    InvalidIdentity {
        /// What was wrong with the header.
        message: String,
    },

    /// The requested service definition is not in the catalog.
    #[error("Service definition does not exist: id={service_definition_id}")]
    ServiceDefinitionNotFound {
        /// The requested service definition id.
        service_definition_id: String,
    },

    /// The requested plan is not part of the resolved service definition.
    #[error("Service definition plan does not exist: id={plan_id}")]
    PlanNotFound {
        /// The requested plan id.
        plan_id: String,
    },

    /// One or more request fields are missing or invalid.
    #[error("{0}")]
    Validation(FieldErrors),

    /// The request body could not be read as a JSON document.
    #[error("Request body is not readable: {message}")]
    MalformedBody {
        /// Parser message.
        message: String,
    },

    /// The broker rejected the supplied parameters.
    #[error("{message}")]
    InvalidParameters {
        /// Human-readable error message.
        message: String,
    },

    /// A service instance with the same id already exists with different attributes.
    #[error(
        "Service instance with the given ID already exists: \
         serviceInstanceId={service_instance_id}, serviceDefinitionId={service_definition_id}"
    )]
    InstanceExists {
        /// The conflicting instance id.
        service_instance_id: String,
        /// The service definition of the request.
        service_definition_id: String,
    },

    /// The service instance does not exist.
    #[error("Service instance does not exist: id={service_instance_id}")]
    InstanceNotFound {
        /// The requested instance id.
        service_instance_id: String,
    },

    /// A binding with the same id already exists with different attributes.
    #[error(
        "Service instance binding already exists: \
         serviceInstanceId={service_instance_id}, bindingId={binding_id}"
    )]
    BindingExists {
        /// The instance the binding belongs to.
        service_instance_id: String,
        /// The conflicting binding id.
        binding_id: String,
    },

    /// The service binding does not exist.
    #[error("Service binding does not exist: id={binding_id}")]
    BindingNotFound {
        /// The requested binding id.
        binding_id: String,
    },

    /// The operation can only be completed asynchronously.
    #[error("{message}")]
    AsyncRequired {
        /// Human-readable error message.
        message: String,
    },

    /// The request's maintenance info does not match the plan's.
    #[error("{message}")]
    MaintenanceInfoConflict {
        /// Human-readable error message.
        message: String,
    },

    /// Another operation on the same resource is running.
    #[error("{message}")]
    ConcurrencyError {
        /// Human-readable error message.
        message: String,
    },

    /// The requested update cannot be performed.
    #[error("{message}")]
    UpdateNotSupported {
        /// Human-readable error message.
        message: String,
    },

    /// The operation was accepted earlier and is still running.
    #[error("Operation is still in progress")]
    OperationInProgress {
        /// Token the platform uses to poll the running operation.
        operation: Option<String>,
    },

    /// The broker does not implement the requested operation.
    #[error("{message}")]
    OperationNotSupported {
        /// Human-readable error message.
        message: String,
    },

    /// The broker cannot serve requests right now.
    #[error("{message}")]
    ServiceBrokerUnavailable {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("{message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl BrokerError {
    /// Creates a version-missing error.
    #[must_use]
    pub fn version_missing(header: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::VersionMissing {
            header: header.into(),
            expected: expected.into(),
        }
    }

    /// Creates a version-mismatch error.
    #[must_use]
    pub fn version_mismatch(expected: impl Into<String>, provided: impl Into<String>) -> Self {
        Self::VersionMismatch {
            expected: expected.into(),
            provided: provided.into(),
        }
    }

    /// Creates an invalid-identity error.
    #[must_use]
    pub fn invalid_identity(message: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            message: message.into(),
        }
    }

    /// Creates a service-definition-not-found error.
    #[must_use]
    pub fn service_definition_not_found(service_definition_id: impl Into<String>) -> Self {
        Self::ServiceDefinitionNotFound {
            service_definition_id: service_definition_id.into(),
        }
    }

    /// Creates a plan-not-found error.
    #[must_use]
    pub fn plan_not_found(plan_id: impl Into<String>) -> Self {
        Self::PlanNotFound {
            plan_id: plan_id.into(),
        }
    }

    /// Creates a malformed-body error.
    #[must_use]
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// Creates an invalid-parameters error.
    #[must_use]
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Creates an instance-exists error.
    #[must_use]
    pub fn instance_exists(
        service_instance_id: impl Into<String>,
        service_definition_id: impl Into<String>,
    ) -> Self {
        Self::InstanceExists {
            service_instance_id: service_instance_id.into(),
            service_definition_id: service_definition_id.into(),
        }
    }

    /// Creates an instance-not-found error.
    #[must_use]
    pub fn instance_not_found(service_instance_id: impl Into<String>) -> Self {
        Self::InstanceNotFound {
            service_instance_id: service_instance_id.into(),
        }
    }

    /// Creates a binding-exists error.
    #[must_use]
    pub fn binding_exists(
        service_instance_id: impl Into<String>,
        binding_id: impl Into<String>,
    ) -> Self {
        Self::BindingExists {
            service_instance_id: service_instance_id.into(),
            binding_id: binding_id.into(),
        }
    }

    /// Creates a binding-not-found error.
    #[must_use]
    pub fn binding_not_found(binding_id: impl Into<String>) -> Self {
        Self::BindingNotFound {
            binding_id: binding_id.into(),
        }
    }

    /// Creates an async-required error with the default message.
    #[must_use]
    pub fn async_required() -> Self {
        Self::AsyncRequired {
            message: ASYNC_REQUIRED_MESSAGE.to_string(),
        }
    }

    /// Creates a maintenance-info-conflict error.
    ///
    /// A `None` message falls back to the default description.
    #[must_use]
    pub fn maintenance_info_conflict(message: Option<String>) -> Self {
        Self::MaintenanceInfoConflict {
            message: message.unwrap_or_else(|| MAINTENANCE_INFO_CONFLICT_MESSAGE.to_string()),
        }
    }

    /// Creates a concurrency error with the default message.
    #[must_use]
    pub fn concurrency_error() -> Self {
        Self::ConcurrencyError {
            message: CONCURRENCY_ERROR_MESSAGE.to_string(),
        }
    }

    /// Creates an update-not-supported error.
    #[must_use]
    pub fn update_not_supported(message: impl Into<String>) -> Self {
        Self::UpdateNotSupported {
            message: message.into(),
        }
    }

    /// Creates an operation-in-progress failure carrying the polling token.
    #[must_use]
    pub fn operation_in_progress(operation: Option<String>) -> Self {
        Self::OperationInProgress { operation }
    }

    /// Creates an operation-not-supported error.
    #[must_use]
    pub fn operation_not_supported(message: impl Into<String>) -> Self {
        Self::OperationNotSupported {
            message: message.into(),
        }
    }

    /// Creates a broker-unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceBrokerUnavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the stable machine-readable code, if this failure has one.
    #[must_use]
    pub const fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::AsyncRequired { .. } => Some(ASYNC_REQUIRED_CODE),
            Self::MaintenanceInfoConflict { .. } => Some(MAINTENANCE_INFO_CONFLICT_CODE),
            Self::ConcurrencyError { .. } => Some(CONCURRENCY_ERROR_CODE),
            _ => None,
        }
    }

    /// Returns the status code used when the operation does not override it.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::VersionMissing { .. }
            | Self::InvalidIdentity { .. }
            | Self::ServiceDefinitionNotFound { .. }
            | Self::PlanNotFound { .. }
            | Self::Validation(_)
            | Self::InvalidParameters { .. } => StatusCode::BAD_REQUEST,
            Self::VersionMismatch { .. } => StatusCode::PRECONDITION_FAILED,
            Self::InstanceExists { .. } | Self::BindingExists { .. } => StatusCode::CONFLICT,
            Self::BindingNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MalformedBody { .. }
            | Self::InstanceNotFound { .. }
            | Self::AsyncRequired { .. }
            | Self::MaintenanceInfoConflict { .. }
            | Self::ConcurrencyError { .. }
            | Self::UpdateNotSupported { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OperationInProgress { .. } => StatusCode::ACCEPTED,
            Self::OperationNotSupported { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::ServiceBrokerUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the human-readable description sent to the platform.
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Converts this error to its wire document.
    #[must_use]
    pub fn to_error_message(&self) -> ErrorMessage {
        ErrorMessage {
            error: self.error_code().map(ToString::to_string),
            description: self.description(),
        }
    }
}

/// Request fields that failed validation.
///
/// Field names keep the order in which they were reported, so the joined
/// description is stable for a given request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    /// Field names paired with what was wrong with each.
    pub fields: Vec<(String, String)>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push((field.into(), message.into()));
    }

    /// Records `field` as missing when `value` is absent or blank.
    pub fn require(&mut self, field: &str, value: Option<&str>) {
        if value.map_or(true, |v| v.trim().is_empty()) {
            self.add(field, "must not be empty");
        }
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of reported errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the distinct invalid field names in report order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.fields.len());
        for (field, _) in &self.fields {
            if !names.contains(&field.as_str()) {
                names.push(field);
            }
        }
        names
    }

    /// Converts into a result, failing when any field was reported.
    pub fn into_result(self) -> BrokerResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BrokerError::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Missing or invalid request fields: {}",
            self.field_names().join(", ")
        )
    }
}

/// Serializable error document for HTTP responses.
///
/// ```json
/// { "error": "AsyncRequired", "description": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Machine-readable error code, omitted when the failure has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable description.
    pub description: String,
}

impl ErrorMessage {
    /// Creates an error document without a code.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            error: None,
            description: description.into(),
        }
    }
}

impl From<&BrokerError> for ErrorMessage {
    fn from(error: &BrokerError) -> Self {
        error.to_error_message()
    }
}

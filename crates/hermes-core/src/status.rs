//! Status code derivation for broker operations.
//!
//! Every operation answers with a status derived only from the broker's
//! response, the failure it raised, and whether the platform accepted an
//! asynchronous answer. The functions here are pure; the server turns their
//! results into HTTP responses.
//!
//! | Operation | Success | Failure overrides |
//! |---|---|---|
//! | create instance | 201, 200 if it existed, 202 if async | - |
//! | update instance | 200, 202 if async | - |
//! | delete instance | 200, 202 if async | `InstanceNotFound` → 410 |
//! | get instance | 200 | `InstanceNotFound`, `OperationInProgress` → 404 |
//! | last operation | 200, 410 after a delete | `InstanceNotFound`, `BindingNotFound` → 400 |
//! | create binding | 201, 200 if it existed, 202 if async | - |
//! | get binding | 200 | `BindingNotFound`, `OperationInProgress` → 404 |
//! | delete binding | 200, 202 if async | `BindingNotFound` → 410, `InstanceNotFound` → 422 |
//!
//! Failures without an override use [`BrokerError::status_code`].

use crate::binding::{
    BindingStatus, CreateServiceInstanceBindingResponse, DeleteServiceInstanceBindingResponse,
    GetServiceInstanceBindingResponse,
};
use crate::error::{BrokerError, BrokerResult};
use crate::instance::{
    CreateServiceInstanceResponse, DeleteServiceInstanceResponse, GetServiceInstanceResponse,
    UpdateServiceInstanceResponse,
};
use crate::operation::{
    check_operation_length, LastOperationResponse, OperationInProgressMessage, OperationKind,
    OperationState,
};
use http::StatusCode;
use serde_json::Value;

/// A broker response that determines its own success status.
pub trait ResponseStatus {
    /// Status for this response.
    fn success_status(&self) -> StatusCode;

    /// Operation token for polling, if any.
    fn operation(&self) -> Option<&str> {
        None
    }
}

impl ResponseStatus for CreateServiceInstanceResponse {
    fn success_status(&self) -> StatusCode {
        if self.is_async {
            StatusCode::ACCEPTED
        } else if self.instance_existed {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        }
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

impl ResponseStatus for UpdateServiceInstanceResponse {
    fn success_status(&self) -> StatusCode {
        if self.is_async {
            StatusCode::ACCEPTED
        } else {
            StatusCode::OK
        }
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

impl ResponseStatus for DeleteServiceInstanceResponse {
    fn success_status(&self) -> StatusCode {
        if self.is_async {
            StatusCode::ACCEPTED
        } else {
            StatusCode::OK
        }
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

impl ResponseStatus for GetServiceInstanceResponse {
    fn success_status(&self) -> StatusCode {
        StatusCode::OK
    }
}

impl ResponseStatus for LastOperationResponse {
    fn success_status(&self) -> StatusCode {
        if self.state == OperationState::Succeeded && self.delete_operation {
            StatusCode::GONE
        } else {
            StatusCode::OK
        }
    }
}

impl ResponseStatus for CreateServiceInstanceBindingResponse {
    fn success_status(&self) -> StatusCode {
        if self.is_async {
            StatusCode::ACCEPTED
        } else if self.status == BindingStatus::New {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        }
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

impl ResponseStatus for GetServiceInstanceBindingResponse {
    fn success_status(&self) -> StatusCode {
        StatusCode::OK
    }
}

impl ResponseStatus for DeleteServiceInstanceBindingResponse {
    fn success_status(&self) -> StatusCode {
        if self.is_async {
            StatusCode::ACCEPTED
        } else {
            StatusCode::OK
        }
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

/// Status when the broker returned no response body.
pub const fn empty_status(kind: OperationKind) -> StatusCode {
    match kind {
        OperationKind::CreateInstance | OperationKind::CreateBinding => StatusCode::CREATED,
        _ => StatusCode::OK,
    }
}

/// Status for a successful broker answer.
///
/// An asynchronous response answers 202 whatever `accepts_incomplete` was;
/// a broker that needs the platform's consent raises
/// [`BrokerError::AsyncRequired`] itself.
///
/// # Errors
///
/// Returns [`BrokerError::Internal`] when the operation token is too long.
pub fn success_status<R: ResponseStatus>(
    kind: OperationKind,
    response: Option<&R>,
) -> BrokerResult<StatusCode> {
    let Some(response) = response else {
        return Ok(empty_status(kind));
    };

    check_operation_length(response.operation())?;

    Ok(response.success_status())
}

/// Status for a failure raised while handling `kind`.
pub fn error_status(kind: OperationKind, error: &BrokerError) -> StatusCode {
    use OperationKind as K;

    match (kind, error) {
        (K::DeleteInstance, BrokerError::InstanceNotFound { .. })
        | (K::DeleteBinding, BrokerError::BindingNotFound { .. }) => StatusCode::GONE,
        (
            K::GetInstance,
            BrokerError::InstanceNotFound { .. } | BrokerError::OperationInProgress { .. },
        )
        | (
            K::GetBinding,
            BrokerError::BindingNotFound { .. } | BrokerError::OperationInProgress { .. },
        ) => StatusCode::NOT_FOUND,
        (
            K::InstanceLastOperation | K::BindingLastOperation,
            BrokerError::InstanceNotFound { .. } | BrokerError::BindingNotFound { .. },
        ) => StatusCode::BAD_REQUEST,
        (K::DeleteBinding | K::CreateBinding, BrokerError::InstanceNotFound { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => error.status_code(),
    }
}

/// Body sent with a failure answered with `status`.
///
/// An in-progress failure answered with 202 carries the polling token;
/// every other failure carries the error document.
pub fn error_body(status: StatusCode, error: &BrokerError) -> Value {
    let body = match error {
        BrokerError::OperationInProgress { operation } if status == StatusCode::ACCEPTED => {
            serde_json::to_value(OperationInProgressMessage {
                operation: operation.clone(),
            })
        }
        _ => serde_json::to_value(error.to_error_message()),
    };
    body.unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

//! Operation kinds and the shared last-operation types.

use crate::error::{BrokerError, BrokerResult};
use serde::{Deserialize, Serialize};

/// Maximum length of an operation token returned by a broker.
pub const MAX_OPERATION_LENGTH: usize = 10_000;

/// The broker operations this layer dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `PUT /v2/service_instances/{id}`
    CreateInstance,
    /// `PATCH /v2/service_instances/{id}`
    UpdateInstance,
    /// `DELETE /v2/service_instances/{id}`
    DeleteInstance,
    /// `GET /v2/service_instances/{id}`
    GetInstance,
    /// `GET /v2/service_instances/{id}/last_operation`
    InstanceLastOperation,
    /// `PUT /v2/service_instances/{id}/service_bindings/{binding_id}`
    CreateBinding,
    /// `GET /v2/service_instances/{id}/service_bindings/{binding_id}`
    GetBinding,
    /// `DELETE /v2/service_instances/{id}/service_bindings/{binding_id}`
    DeleteBinding,
    /// `GET /v2/service_instances/{id}/service_bindings/{binding_id}/last_operation`
    BindingLastOperation,
}

impl OperationKind {
    /// All operation kinds.
    pub const ALL: [Self; 9] = [
        Self::CreateInstance,
        Self::UpdateInstance,
        Self::DeleteInstance,
        Self::GetInstance,
        Self::InstanceLastOperation,
        Self::CreateBinding,
        Self::GetBinding,
        Self::DeleteBinding,
        Self::BindingLastOperation,
    ];

    /// Returns the name used in logs and metric labels.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateInstance => "create_instance",
            Self::UpdateInstance => "update_instance",
            Self::DeleteInstance => "delete_instance",
            Self::GetInstance => "get_instance",
            Self::InstanceLastOperation => "instance_last_operation",
            Self::CreateBinding => "create_binding",
            Self::GetBinding => "get_binding",
            Self::DeleteBinding => "delete_binding",
            Self::BindingLastOperation => "binding_last_operation",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// State of an asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    /// The operation is still running.
    #[serde(rename = "in progress")]
    InProgress,
    /// The operation completed.
    #[serde(rename = "succeeded")]
    Succeeded,
    /// The operation failed.
    #[serde(rename = "failed")]
    Failed,
}

/// Response to a last-operation poll, for instances and bindings alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperationResponse {
    /// Current state.
    pub state: OperationState,
    /// Human-readable progress message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the instance is usable after a failed update or deprovision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_usable: Option<bool>,
    /// Whether a failed update can be repeated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_repeatable: Option<bool>,
    /// Whether the polled operation was a delete; a succeeded delete answers 410.
    #[serde(skip)]
    pub delete_operation: bool,
}

impl LastOperationResponse {
    /// Creates a response in the given state.
    pub fn new(state: OperationState) -> Self {
        Self {
            state,
            description: None,
            instance_usable: None,
            update_repeatable: None,
            delete_operation: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the polled operation as a delete.
    #[must_use]
    pub fn with_delete_operation(mut self, delete_operation: bool) -> Self {
        self.delete_operation = delete_operation;
        self
    }

    /// Sets the instance-usable flag.
    #[must_use]
    pub fn with_instance_usable(mut self, usable: bool) -> Self {
        self.instance_usable = Some(usable);
        self
    }

    /// Sets the update-repeatable flag.
    #[must_use]
    pub fn with_update_repeatable(mut self, repeatable: bool) -> Self {
        self.update_repeatable = Some(repeatable);
        self
    }
}

/// Body sent with a 202 answer for an operation that is still running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInProgressMessage {
    /// Token for polling the running operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

/// Checks an operation token against [`MAX_OPERATION_LENGTH`].
///
/// # Errors
///
/// Returns [`BrokerError::Internal`] when the token is too long.
pub fn check_operation_length(operation: Option<&str>) -> BrokerResult<()> {
    match operation {
        Some(token) if token.chars().count() > MAX_OPERATION_LENGTH => Err(BrokerError::internal(
            format!("operation token exceeds {MAX_OPERATION_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_names() {
        assert_eq!(serde_json::to_string(&OperationState::InProgress).unwrap(), "\"in progress\"");
        assert_eq!(serde_json::to_string(&OperationState::Succeeded).unwrap(), "\"succeeded\"");
        let failed: OperationState = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(failed, OperationState::Failed);
    }

    #[test]
    fn test_last_operation_hides_delete_flag() {
        let response = LastOperationResponse::new(OperationState::Succeeded)
            .with_description("done")
            .with_delete_operation(true);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"state":"succeeded","description":"done"}"#);
    }

    #[test]
    fn test_operation_length() {
        assert!(check_operation_length(None).is_ok());
        assert!(check_operation_length(Some(&"a".repeat(MAX_OPERATION_LENGTH))).is_ok());
        let too_long = "a".repeat(MAX_OPERATION_LENGTH + 1);
        let error = check_operation_length(Some(&too_long)).unwrap_err();
        assert_eq!(error.status_code().as_u16(), 500);
    }

    #[test]
    fn test_in_progress_message() {
        let empty = serde_json::to_string(&OperationInProgressMessage::default()).unwrap();
        assert_eq!(empty, "{}");
        let message = OperationInProgressMessage {
            operation: Some("task-1".to_string()),
        };
        assert_eq!(serde_json::to_string(&message).unwrap(), r#"{"operation":"task-1"}"#);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = OperationKind::ALL.iter().map(|kind| kind.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OperationKind::ALL.len());
    }
}

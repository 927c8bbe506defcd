//! Service instance operation types.
//!
//! Each operation has a request type carrying the protocol fields plus the
//! request scope and resolved catalog entries, and a response type whose
//! optional fields are omitted from the wire form when absent. Request
//! bodies arrive as the `*Body` types and are validated before the broker is
//! invoked.

use crate::catalog::{MaintenanceInfo, Plan, ResolvedDefinition, ServiceDefinition};
use crate::context::RequestContext;
use crate::error::{BrokerResult, FieldErrors};
use crate::identity::{Context, Properties};
use crate::operation::LastOperationResponse;
use serde::{Deserialize, Serialize};

/// Labels and attributes attached to a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceMetadata {
    /// Key/value labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Properties>,
    /// Key/value attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Properties>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Body of a provision request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServiceInstanceBody {
    /// Service definition id.
    #[serde(default)]
    pub service_id: Option<String>,
    /// Plan id.
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Deprecated Cloud Foundry organization guid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_guid: Option<String>,
    /// Deprecated Cloud Foundry space guid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_guid: Option<String>,
    /// Platform context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Broker-specific parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Properties>,
    /// Maintenance info the platform expects the instance to have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_info: Option<MaintenanceInfo>,
}

impl CreateServiceInstanceBody {
    /// Checks that `service_id` and `plan_id` are present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BrokerError::Validation`] naming every missing field.
    pub fn validate(&self) -> BrokerResult<()> {
        let mut errors = FieldErrors::new();
        errors.require("service_id", self.service_id.as_deref());
        errors.require("plan_id", self.plan_id.as_deref());
        errors.into_result()
    }

    /// Builds the operation request once the catalog entries are resolved.
    pub fn into_request(
        self,
        service_instance_id: impl Into<String>,
        resolved: ResolvedDefinition,
        accepts_incomplete: bool,
        scope: RequestContext,
    ) -> CreateServiceInstanceRequest {
        CreateServiceInstanceRequest {
            service_instance_id: service_instance_id.into(),
            service_definition_id: self.service_id.unwrap_or_default(),
            plan_id: self.plan_id.unwrap_or_default(),
            service_definition: resolved.service_definition,
            plan: resolved.plan,
            organization_guid: self.organization_guid,
            space_guid: self.space_guid,
            context: self.context,
            parameters: self.parameters,
            maintenance_info: self.maintenance_info,
            accepts_incomplete,
            scope,
        }
    }
}

/// Request to provision a service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServiceInstanceRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Requested service definition id.
    pub service_definition_id: String,
    /// Requested plan id.
    pub plan_id: String,
    /// Resolved service definition, narrowed to the requested plan.
    pub service_definition: ServiceDefinition,
    /// Resolved plan.
    pub plan: Option<Plan>,
    /// Deprecated Cloud Foundry organization guid.
    pub organization_guid: Option<String>,
    /// Deprecated Cloud Foundry space guid.
    pub space_guid: Option<String>,
    /// Platform context.
    pub context: Option<Context>,
    /// Broker-specific parameters.
    pub parameters: Option<Properties>,
    /// Maintenance info the platform expects.
    pub maintenance_info: Option<MaintenanceInfo>,
    /// Whether the platform accepts an asynchronous answer.
    pub accepts_incomplete: bool,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// Result of provisioning a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServiceInstanceResponse {
    /// Whether provisioning continues asynchronously.
    #[serde(skip)]
    pub is_async: bool,
    /// Whether an identical instance already existed.
    #[serde(skip)]
    pub instance_existed: bool,
    /// Dashboard URL for the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    /// Token for polling the asynchronous operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Instance metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ServiceInstanceMetadata>,
}

impl CreateServiceInstanceResponse {
    /// Creates an empty synchronous response for a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the async flag.
    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the instance-existed flag.
    #[must_use]
    pub fn with_instance_existed(mut self, existed: bool) -> Self {
        self.instance_existed = existed;
        self
    }

    /// Sets the dashboard URL.
    #[must_use]
    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = Some(url.into());
        self
    }

    /// Sets the operation token.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ServiceInstanceMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Values the instance had before an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousValues {
    /// Previous service definition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Previous plan id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Previous organization id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Previous space id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Previous maintenance info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_info: Option<MaintenanceInfo>,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServiceInstanceBody {
    /// Service definition id.
    #[serde(default)]
    pub service_id: Option<String>,
    /// New plan id, if the plan changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Platform context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Broker-specific parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Properties>,
    /// Values before the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<PreviousValues>,
    /// Maintenance info to move to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_info: Option<MaintenanceInfo>,
}

impl UpdateServiceInstanceBody {
    /// Checks that `service_id` is present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BrokerError::Validation`] when it is missing.
    pub fn validate(&self) -> BrokerResult<()> {
        let mut errors = FieldErrors::new();
        errors.require("service_id", self.service_id.as_deref());
        errors.into_result()
    }

    /// Builds the operation request once the catalog entries are resolved.
    pub fn into_request(
        self,
        service_instance_id: impl Into<String>,
        resolved: ResolvedDefinition,
        accepts_incomplete: bool,
        scope: RequestContext,
    ) -> UpdateServiceInstanceRequest {
        UpdateServiceInstanceRequest {
            service_instance_id: service_instance_id.into(),
            service_definition_id: self.service_id.unwrap_or_default(),
            plan_id: self.plan_id,
            service_definition: resolved.service_definition,
            plan: resolved.plan,
            context: self.context,
            parameters: self.parameters,
            previous_values: self.previous_values,
            maintenance_info: self.maintenance_info,
            accepts_incomplete,
            scope,
        }
    }
}

/// Request to update a service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateServiceInstanceRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Service definition id.
    pub service_definition_id: String,
    /// New plan id.
    pub plan_id: Option<String>,
    /// Resolved service definition.
    pub service_definition: ServiceDefinition,
    /// Resolved new plan.
    pub plan: Option<Plan>,
    /// Platform context.
    pub context: Option<Context>,
    /// Broker-specific parameters.
    pub parameters: Option<Properties>,
    /// Values before the update.
    pub previous_values: Option<PreviousValues>,
    /// Maintenance info to move to.
    pub maintenance_info: Option<MaintenanceInfo>,
    /// Whether the platform accepts an asynchronous answer.
    pub accepts_incomplete: bool,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// Result of updating a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServiceInstanceResponse {
    /// Whether the update continues asynchronously.
    #[serde(skip)]
    pub is_async: bool,
    /// Dashboard URL for the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    /// Token for polling the asynchronous operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Instance metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ServiceInstanceMetadata>,
}

impl UpdateServiceInstanceResponse {
    /// Creates an empty synchronous response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the async flag.
    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the operation token.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the dashboard URL.
    #[must_use]
    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = Some(url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Request to deprovision a service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteServiceInstanceRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Service definition id from the query.
    pub service_definition_id: String,
    /// Plan id from the query.
    pub plan_id: String,
    /// Resolved service definition.
    pub service_definition: ServiceDefinition,
    /// Resolved plan.
    pub plan: Option<Plan>,
    /// Whether the platform accepts an asynchronous answer.
    pub accepts_incomplete: bool,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// Result of deprovisioning a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteServiceInstanceResponse {
    /// Whether deprovisioning continues asynchronously.
    #[serde(skip)]
    pub is_async: bool,
    /// Token for polling the asynchronous operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl DeleteServiceInstanceResponse {
    /// Creates an empty synchronous response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the async flag.
    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the operation token.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Get and last operation
// ---------------------------------------------------------------------------

/// Request to fetch a service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetServiceInstanceRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// A fetched service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetServiceInstanceResponse {
    /// Service definition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Plan id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Dashboard URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    /// Parameters the instance was provisioned with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Properties>,
    /// Current maintenance info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_info: Option<MaintenanceInfo>,
    /// Instance metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ServiceInstanceMetadata>,
}

/// Request to poll the last operation on a service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetLastServiceOperationRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Service definition id from the query.
    pub service_definition_id: Option<String>,
    /// Plan id from the query.
    pub plan_id: Option<String>,
    /// Operation token from the query.
    pub operation: Option<String>,
    /// Resolved service definition, when `service_definition_id` was given.
    pub service_definition: Option<ServiceDefinition>,
    /// Resolved plan, when both ids were given.
    pub plan: Option<Plan>,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// Result of polling an instance's last operation.
pub type GetLastServiceOperationResponse = LastOperationResponse;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrokerError;
    use serde_json::json;

    #[test]
    fn test_create_body_validation_names_all_fields() {
        let body: CreateServiceInstanceBody = serde_json::from_value(json!({})).unwrap();
        let error = body.validate().unwrap_err();
        match &error {
            BrokerError::Validation(fields) => {
                assert_eq!(fields.field_names(), vec!["service_id", "plan_id"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(error.status_code().as_u16(), 400);
    }

    #[test]
    fn test_create_body_full() {
        let body: CreateServiceInstanceBody = serde_json::from_value(json!({
            "service_id": "svc",
            "plan_id": "plan",
            "organization_guid": "org",
            "space_guid": "space",
            "context": {
                "platform": "cloudfoundry",
                "organization_guid": "org",
                "space_guid": "space"
            },
            "parameters": {"size": 3},
            "maintenance_info": {"version": "2.0.0"}
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.context.as_ref().and_then(Context::organization_guid), Some("org"));
        assert_eq!(body.parameters.as_ref().unwrap()["size"], json!(3));
    }

    #[test]
    fn test_update_requires_service_id_only() {
        let parse = |value| serde_json::from_value::<UpdateServiceInstanceBody>(value).unwrap();

        assert!(parse(json!({"service_id": "s"})).validate().is_ok());
        assert!(parse(json!({"plan_id": "p"})).validate().is_err());
    }

    #[test]
    fn test_create_response_wire_form() {
        let response = CreateServiceInstanceResponse::new()
            .with_async(true)
            .with_instance_existed(true)
            .with_operation("op-1");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"operation":"op-1"}"#);

        let empty = serde_json::to_string(&CreateServiceInstanceResponse::new()).unwrap();
        assert_eq!(empty, "{}");
    }

    #[test]
    fn test_get_response_omits_absent_fields() {
        let response = GetServiceInstanceResponse {
            service_id: Some("s".to_string()),
            ..GetServiceInstanceResponse::default()
        };
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"service_id":"s"}"#);
    }
}

//! Service binding operation types.

use crate::catalog::{Plan, ResolvedDefinition, ServiceDefinition};
use crate::context::RequestContext;
use crate::error::{BrokerResult, FieldErrors};
use crate::identity::{Context, Properties};
use crate::operation::LastOperationResponse;
use serde::{Deserialize, Serialize};

/// Resource a binding is created for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindResource {
    /// Application guid, for application bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_guid: Option<String>,
    /// Route address, for route bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Any other platform-specific fields.
    #[serde(flatten)]
    pub properties: Properties,
}

/// Body of a bind request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServiceInstanceBindingBody {
    /// Service definition id.
    #[serde(default)]
    pub service_id: Option<String>,
    /// Plan id.
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Deprecated application guid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_guid: Option<String>,
    /// Resource being bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_resource: Option<BindResource>,
    /// Platform context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Broker-specific parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Properties>,
}

impl CreateServiceInstanceBindingBody {
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
        binding_id: impl Into<String>,
        resolved: ResolvedDefinition,
        accepts_incomplete: bool,
        scope: RequestContext,
    ) -> CreateServiceInstanceBindingRequest {
        CreateServiceInstanceBindingRequest {
            service_instance_id: service_instance_id.into(),
            binding_id: binding_id.into(),
            service_definition_id: self.service_id.unwrap_or_default(),
            plan_id: self.plan_id.unwrap_or_default(),
            service_definition: resolved.service_definition,
            plan: resolved.plan,
            app_guid: self.app_guid,
            bind_resource: self.bind_resource,
            context: self.context,
            parameters: self.parameters,
            accepts_incomplete,
            scope,
        }
    }
}

/// Request to create a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServiceInstanceBindingRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Binding id from the path.
    pub binding_id: String,
    /// Service definition id.
    pub service_definition_id: String,
    /// Plan id.
    pub plan_id: String,
    /// Resolved service definition, narrowed to the requested plan.
    pub service_definition: ServiceDefinition,
    /// Resolved plan.
    pub plan: Option<Plan>,
    /// Deprecated application guid.
    pub app_guid: Option<String>,
    /// Resource being bound.
    pub bind_resource: Option<BindResource>,
    /// Platform context.
    pub context: Option<Context>,
    /// Broker-specific parameters.
    pub parameters: Option<Properties>,
    /// Whether the platform accepts an asynchronous answer.
    pub accepts_incomplete: bool,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// Whether a create-binding request found an existing binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingStatus {
    /// A new binding was created.
    #[default]
    New,
    /// The binding already existed with the same parameters.
    ExistsWithIdenticalParameters,
    /// A binding with this id exists with different parameters.
    ExistsWithDifferentParameters,
}

/// Volume access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeMode {
    /// Read only.
    #[serde(rename = "r")]
    ReadOnly,
    /// Read and write.
    #[serde(rename = "rw")]
    ReadWrite,
}

/// Shared volume device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDevice {
    /// Volume identifier.
    pub volume_id: String,
    /// Driver-specific mount configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_config: Option<Properties>,
}

/// A volume mount returned with a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Volume driver name.
    pub driver: String,
    /// Path inside the container.
    pub container_dir: String,
    /// Access mode.
    pub mode: VolumeMode,
    /// Device type, `shared` for shared devices.
    pub device_type: String,
    /// Device details.
    pub device: VolumeDevice,
}

/// A network endpoint an application can reach through the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// Ports or port ranges.
    pub ports: Vec<String>,
    /// `tcp`, `udp` or `all`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Expiry information of a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingMetadata {
    /// When the credentials expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// When the platform should rotate the binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_before: Option<String>,
}

/// Result of creating a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServiceInstanceBindingResponse {
    /// Whether binding continues asynchronously.
    #[serde(skip)]
    pub is_async: bool,
    /// Whether the binding already existed.
    #[serde(skip)]
    pub status: BindingStatus,
    /// Credentials for the bound application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Properties>,
    /// Syslog drain URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog_drain_url: Option<String>,
    /// Route service URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
    /// Volume mounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Network endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    /// Binding metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BindingMetadata>,
    /// Token for polling the asynchronous operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl CreateServiceInstanceBindingResponse {
    /// Creates an empty response for a new binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the async flag.
    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the binding status.
    #[must_use]
    pub fn with_status(mut self, status: BindingStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Properties) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the operation token.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the route service URL.
    #[must_use]
    pub fn with_route_service_url(mut self, url: impl Into<String>) -> Self {
        self.route_service_url = Some(url.into());
        self
    }
}

/// Request to fetch a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetServiceInstanceBindingRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Binding id from the path.
    pub binding_id: String,
    /// Request-scoped fields.
    pub scope: RequestContext,
}

/// A fetched binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetServiceInstanceBindingResponse {
    /// Credentials for the bound application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Properties>,
    /// Syslog drain URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog_drain_url: Option<String>,
    /// Route service URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
    /// Volume mounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Network endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    /// Parameters the binding was created with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Properties>,
    /// Binding metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BindingMetadata>,
}

/// Request to delete a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteServiceInstanceBindingRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Binding id from the path.
    pub binding_id: String,
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

/// Result of deleting a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteServiceInstanceBindingResponse {
    /// Whether unbinding continues asynchronously.
    #[serde(skip)]
    pub is_async: bool,
    /// Token for polling the asynchronous operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl DeleteServiceInstanceBindingResponse {
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

/// Request to poll the last operation on a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetLastServiceBindingOperationRequest {
    /// Instance id from the path.
    pub service_instance_id: String,
    /// Binding id from the path.
    pub binding_id: String,
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

/// Result of polling a binding's last operation.
pub type GetLastServiceBindingOperationResponse = LastOperationResponse;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bind_body_with_route_resource() {
        let body: CreateServiceInstanceBindingBody = serde_json::from_value(json!({
            "service_id": "s",
            "plan_id": "p",
            "bind_resource": {"route": "app.example.com", "extra": true}
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        let resource = body.bind_resource.unwrap();
        assert_eq!(resource.route.as_deref(), Some("app.example.com"));
        assert_eq!(resource.properties.get("extra"), Some(&json!(true)));
    }

    #[test]
    fn test_bind_body_missing_plan() {
        let body: CreateServiceInstanceBindingBody =
            serde_json::from_value(json!({"service_id": "s"})).unwrap();
        let error = body.validate().unwrap_err();
        assert!(error.description().contains("plan_id"));
        assert!(!error.description().contains("service_id"));
    }

    #[test]
    fn test_binding_response_wire_form() {
        let mut credentials = Properties::new();
        credentials.insert("uri".to_string(), json!("db://host"));
        let response = CreateServiceInstanceBindingResponse::new()
            .with_status(BindingStatus::ExistsWithIdenticalParameters)
            .with_credentials(credentials);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"credentials": {"uri": "db://host"}}));
    }

    #[test]
    fn test_volume_mount_wire_form() {
        let mount = VolumeMount {
            driver: "nfs".to_string(),
            container_dir: "/data".to_string(),
            mode: VolumeMode::ReadWrite,
            device_type: "shared".to_string(),
            device: VolumeDevice {
                volume_id: "vol-1".to_string(),
                mount_config: None,
            },
        };
        let value = serde_json::to_value(&mount).unwrap();
        assert_eq!(value["mode"], json!("rw"));
        assert!(value["device"].get("mount_config").is_none());
    }
}

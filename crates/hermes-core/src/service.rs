//! Broker implementation interfaces.
//!
//! A broker supplies its business logic by implementing these traits. The
//! protocol layer calls them after the request has passed the version gate,
//! had its scope assembled, and had its catalog entries resolved.
//!
//! Operations the protocol marks as optional have default implementations
//! answering [`BrokerError::OperationNotSupported`] (or
//! [`BrokerError::UpdateNotSupported`] for updates).

use crate::binding::{
    CreateServiceInstanceBindingRequest, CreateServiceInstanceBindingResponse,
    DeleteServiceInstanceBindingRequest, DeleteServiceInstanceBindingResponse,
    GetLastServiceBindingOperationRequest, GetServiceInstanceBindingRequest,
    GetServiceInstanceBindingResponse,
};
use crate::catalog::Catalog;
use crate::error::{BrokerError, BrokerResult};
use crate::instance::{
    CreateServiceInstanceRequest, CreateServiceInstanceResponse, DeleteServiceInstanceRequest,
    DeleteServiceInstanceResponse, GetLastServiceOperationRequest, GetServiceInstanceRequest,
    GetServiceInstanceResponse, UpdateServiceInstanceRequest, UpdateServiceInstanceResponse,
};
use crate::operation::LastOperationResponse;
use async_trait::async_trait;

/// Source of the catalog document, consulted on every request.
#[async_trait]
pub trait CatalogService: Send + Sync + 'static {
    /// Returns the current catalog.
    async fn get_catalog(&self) -> BrokerResult<Catalog>;
}

#[async_trait]
impl CatalogService for Catalog {
    async fn get_catalog(&self) -> BrokerResult<Catalog> {
        Ok(self.clone())
    }
}

/// Service instance business logic.
///
/// Create, update, and delete may return `None`, which answers with an empty
/// JSON object and the operation's default status.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use hermes_core::{
///     BrokerResult, CreateServiceInstanceRequest, CreateServiceInstanceResponse,
///     DeleteServiceInstanceRequest, DeleteServiceInstanceResponse, ServiceInstanceService,
/// };
///
/// struct NoopInstances;
///
/// #[async_trait]
/// impl ServiceInstanceService for NoopInstances {
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
/// ```
#[async_trait]
pub trait ServiceInstanceService: Send + Sync + 'static {
    /// Provisions a service instance.
    async fn create_service_instance(
        &self,
        request: CreateServiceInstanceRequest,
    ) -> BrokerResult<Option<CreateServiceInstanceResponse>>;

    /// Updates a service instance.
    async fn update_service_instance(
        &self,
        _request: UpdateServiceInstanceRequest,
    ) -> BrokerResult<Option<UpdateServiceInstanceResponse>> {
        Err(BrokerError::update_not_supported(
            "This service broker does not support updating service instances",
        ))
    }

    /// Deprovisions a service instance.
    async fn delete_service_instance(
        &self,
        request: DeleteServiceInstanceRequest,
    ) -> BrokerResult<Option<DeleteServiceInstanceResponse>>;

    /// Fetches a service instance.
    async fn get_service_instance(
        &self,
        _request: GetServiceInstanceRequest,
    ) -> BrokerResult<GetServiceInstanceResponse> {
        Err(BrokerError::operation_not_supported(
            "This service broker does not support retrieving service instances",
        ))
    }

    /// Polls the last asynchronous operation on an instance.
    async fn get_last_operation(
        &self,
        _request: GetLastServiceOperationRequest,
    ) -> BrokerResult<LastOperationResponse> {
        Err(BrokerError::operation_not_supported(
            "This service broker does not support polling service instance operations",
        ))
    }
}

/// Service binding business logic.
#[async_trait]
pub trait ServiceInstanceBindingService: Send + Sync + 'static {
    /// Creates a binding.
    async fn create_service_instance_binding(
        &self,
        request: CreateServiceInstanceBindingRequest,
    ) -> BrokerResult<Option<CreateServiceInstanceBindingResponse>>;

    /// Fetches a binding.
    async fn get_service_instance_binding(
        &self,
        _request: GetServiceInstanceBindingRequest,
    ) -> BrokerResult<GetServiceInstanceBindingResponse> {
        Err(BrokerError::operation_not_supported(
            "This service broker does not support retrieving service bindings",
        ))
    }

    /// Deletes a binding.
    async fn delete_service_instance_binding(
        &self,
        request: DeleteServiceInstanceBindingRequest,
    ) -> BrokerResult<Option<DeleteServiceInstanceBindingResponse>>;

    /// Polls the last asynchronous operation on a binding.
    async fn get_last_operation(
        &self,
        _request: GetLastServiceBindingOperationRequest,
    ) -> BrokerResult<LastOperationResponse> {
        Err(BrokerError::operation_not_supported(
            "This service broker does not support polling service binding operations",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::fixtures;

    struct Minimal;

    #[async_trait]
    impl ServiceInstanceService for Minimal {
        async fn create_service_instance(
            &self,
            _request: CreateServiceInstanceRequest,
        ) -> BrokerResult<Option<CreateServiceInstanceResponse>> {
            Ok(None)
        }

        async fn delete_service_instance(
            &self,
            _request: DeleteServiceInstanceRequest,
        ) -> BrokerResult<Option<DeleteServiceInstanceResponse>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_catalog_is_its_own_source() {
        let catalog = fixtures::sample_catalog();
        let served = catalog.get_catalog().await.unwrap();
        assert_eq!(served, catalog);
    }

    #[tokio::test]
    async fn test_optional_operations_default_to_unsupported() {
        let error = Minimal
            .get_service_instance(GetServiceInstanceRequest {
                service_instance_id: "i".to_string(),
                scope: RequestContext::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(error.status_code().as_u16(), 501);

        let error = Minimal
            .get_last_operation(GetLastServiceOperationRequest {
                service_instance_id: "i".to_string(),
                service_definition_id: None,
                plan_id: None,
                operation: None,
                service_definition: None,
                plan: None,
                scope: RequestContext::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(error, BrokerError::OperationNotSupported { .. }));
    }

    #[tokio::test]
    async fn test_update_defaults_to_not_supported() {
        let catalog = fixtures::sample_catalog();
        let resolved = catalog
            .resolve(fixtures::SERVICE_ID, Some(fixtures::PLAN_ID))
            .unwrap();
        let request = UpdateServiceInstanceRequest {
            service_instance_id: "i".to_string(),
            service_definition_id: fixtures::SERVICE_ID.to_string(),
            plan_id: Some(fixtures::PLAN_ID.to_string()),
            service_definition: resolved.service_definition,
            plan: resolved.plan,
            context: None,
            parameters: None,
            previous_values: None,
            maintenance_info: None,
            accepts_incomplete: false,
            scope: RequestContext::new(),
        };
        let error = Minimal.update_service_instance(request).await.unwrap_err();
        assert!(matches!(error, BrokerError::UpdateNotSupported { .. }));
        assert_eq!(error.status_code().as_u16(), 422);
    }
}

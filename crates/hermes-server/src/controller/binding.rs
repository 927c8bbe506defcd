//! Service binding operations.

use hermes_core::{
    BindingStatus, BrokerError, BrokerResult, CreateServiceInstanceBindingBody,
    DeleteServiceInstanceBindingRequest, GetLastServiceBindingOperationRequest,
    GetServiceInstanceBindingRequest,
};
use hermes_middleware::Response;

use super::{parse_body, respond, Call, Services};

pub(super) async fn create(services: &Services, call: Call) -> BrokerResult<Response> {
    let bindings = services.bindings()?;
    let body: CreateServiceInstanceBindingBody = parse_body(&call.body)?;
    body.validate()?;

    let resolved = services
        .resolve(body.service_id.as_deref().unwrap_or_default(), body.plan_id.as_deref())
        .await?;
    let accepts_incomplete = call.accepts_incomplete();
    let request = body.into_request(
        call.instance_id.clone(),
        call.binding_id.clone(),
        resolved,
        accepts_incomplete,
        call.scope,
    );

    tracing::debug!(
        instance_id = %request.service_instance_id,
        binding_id = %request.binding_id,
        "creating service binding"
    );

    let response = bindings.create_service_instance_binding(request).await?;
    if response
        .as_ref()
        .is_some_and(|r| r.status == BindingStatus::ExistsWithDifferentParameters)
    {
        return Err(BrokerError::binding_exists(call.instance_id, call.binding_id));
    }

    respond(call.kind, response.as_ref())
}

pub(super) async fn get(services: &Services, call: Call) -> BrokerResult<Response> {
    let bindings = services.bindings()?;
    let request = GetServiceInstanceBindingRequest {
        service_instance_id: call.instance_id,
        binding_id: call.binding_id,
        scope: call.scope,
    };

    let response = bindings.get_service_instance_binding(request).await?;
    respond(call.kind, Some(&response))
}

pub(super) async fn delete(services: &Services, call: Call) -> BrokerResult<Response> {
    let bindings = services.bindings()?;
    let (service_id, plan_id) = call.query.require_ids()?;
    let resolved = services.resolve(service_id, Some(plan_id)).await?;

    let accepts_incomplete = call.accepts_incomplete();
    let request = DeleteServiceInstanceBindingRequest {
        service_instance_id: call.instance_id,
        binding_id: call.binding_id,
        service_definition_id: service_id.to_string(),
        plan_id: plan_id.to_string(),
        service_definition: resolved.service_definition,
        plan: resolved.plan,
        accepts_incomplete,
        scope: call.scope,
    };

    tracing::debug!(
        instance_id = %request.service_instance_id,
        binding_id = %request.binding_id,
        "deleting service binding"
    );

    let response = bindings.delete_service_instance_binding(request).await?;
    respond(call.kind, response.as_ref())
}

pub(super) async fn last_operation(services: &Services, call: Call) -> BrokerResult<Response> {
    let bindings = services.bindings()?;
    let plan_id = call.query.plan_id.as_deref();
    let resolved = match call.query.service_id.as_deref() {
        Some(service_id) => Some(services.resolve(service_id, plan_id).await?),
        None => None,
    };
    let (service_definition, plan) = match resolved {
        Some(resolved) => (Some(resolved.service_definition), resolved.plan),
        None => (None, None),
    };

    let request = GetLastServiceBindingOperationRequest {
        service_instance_id: call.instance_id,
        binding_id: call.binding_id,
        service_definition_id: call.query.service_id,
        plan_id: call.query.plan_id,
        operation: call.query.operation,
        service_definition,
        plan,
        scope: call.scope,
    };

    let response = bindings.get_last_operation(request).await?;
    respond(call.kind, Some(&response))
}

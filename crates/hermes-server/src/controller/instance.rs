//! Service instance operations.

use hermes_core::{
    BrokerResult, CreateServiceInstanceBody, DeleteServiceInstanceRequest,
    GetLastServiceOperationRequest, GetServiceInstanceRequest, UpdateServiceInstanceBody,
};
use hermes_middleware::Response;

use super::{parse_body, respond, Call, Services};

pub(super) async fn create(services: &Services, call: Call) -> BrokerResult<Response> {
    let body: CreateServiceInstanceBody = parse_body(&call.body)?;
    body.validate()?;

    let resolved = services
        .resolve(body.service_id.as_deref().unwrap_or_default(), body.plan_id.as_deref())
        .await?;
    let accepts_incomplete = call.accepts_incomplete();
    let request = body.into_request(call.instance_id, resolved, accepts_incomplete, call.scope);

    tracing::debug!(
        instance_id = %request.service_instance_id,
        service_id = %request.service_definition_id,
        plan_id = %request.plan_id,
        "creating service instance"
    );

    let response = services.instances.create_service_instance(request).await?;
    respond(call.kind, response.as_ref())
}

pub(super) async fn update(services: &Services, call: Call) -> BrokerResult<Response> {
    let body: UpdateServiceInstanceBody = parse_body(&call.body)?;
    body.validate()?;

    let resolved = services
        .resolve(body.service_id.as_deref().unwrap_or_default(), body.plan_id.as_deref())
        .await?;
    let accepts_incomplete = call.accepts_incomplete();
    let request = body.into_request(call.instance_id, resolved, accepts_incomplete, call.scope);

    tracing::debug!(instance_id = %request.service_instance_id, "updating service instance");

    let response = services.instances.update_service_instance(request).await?;
    respond(call.kind, response.as_ref())
}

pub(super) async fn delete(services: &Services, call: Call) -> BrokerResult<Response> {
    let (service_id, plan_id) = call.query.require_ids()?;
    let resolved = services.resolve(service_id, Some(plan_id)).await?;

    let accepts_incomplete = call.accepts_incomplete();
    let request = DeleteServiceInstanceRequest {
        service_instance_id: call.instance_id,
        service_definition_id: service_id.to_string(),
        plan_id: plan_id.to_string(),
        service_definition: resolved.service_definition,
        plan: resolved.plan,
        accepts_incomplete,
        scope: call.scope,
    };

    tracing::debug!(instance_id = %request.service_instance_id, "deleting service instance");

    let response = services.instances.delete_service_instance(request).await?;
    respond(call.kind, response.as_ref())
}

pub(super) async fn get(services: &Services, call: Call) -> BrokerResult<Response> {
    let request = GetServiceInstanceRequest {
        service_instance_id: call.instance_id,
        scope: call.scope,
    };

    let response = services.instances.get_service_instance(request).await?;
    respond(call.kind, Some(&response))
}

pub(super) async fn last_operation(services: &Services, call: Call) -> BrokerResult<Response> {
    let plan_id = call.query.plan_id.as_deref();
    let resolved = match call.query.service_id.as_deref() {
        Some(service_id) => Some(services.resolve(service_id, plan_id).await?),
        None => None,
    };
    let (service_definition, plan) = match resolved {
        Some(resolved) => (Some(resolved.service_definition), resolved.plan),
        None => (None, None),
    };

    let request = GetLastServiceOperationRequest {
        service_instance_id: call.instance_id,
        service_definition_id: call.query.service_id,
        plan_id: call.query.plan_id,
        operation: call.query.operation,
        service_definition,
        plan,
        scope: call.scope,
    };

    let response = services.instances.get_last_operation(request).await?;
    respond(call.kind, Some(&response))
}

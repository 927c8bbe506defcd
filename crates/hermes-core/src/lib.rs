//! # Hermes Core
//!
//! Protocol types and rules for the Hermes service broker layer.
//!
//! This crate provides everything about being protocol-correct that does not
//! depend on a transport:
//!
//! - [`Catalog`] - Catalog document and service/plan resolution
//! - [`Context`] - Platform identity context and the originating identity decoder
//! - [`RequestContext`] - Request-scoped fields attached to every operation
//! - [`BrokerError`] - The closed failure taxonomy and its wire document
//! - [`check_api_version`] - The API version gate
//! - [`status`] - Status code derivation per operation
//! - [`ServiceInstanceService`] / [`ServiceInstanceBindingService`] - Broker interfaces

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod binding;
mod catalog;
mod context;
mod error;
pub mod fixtures;
mod identity;
pub mod instance;
pub mod operation;
mod service;
pub mod status;
mod version;

pub use binding::{
    BindResource, BindingStatus, CreateServiceInstanceBindingBody,
    CreateServiceInstanceBindingRequest, CreateServiceInstanceBindingResponse,
    DeleteServiceInstanceBindingRequest, DeleteServiceInstanceBindingResponse,
    GetLastServiceBindingOperationRequest, GetServiceInstanceBindingRequest,
    GetServiceInstanceBindingResponse,
};
pub use catalog::{
    Catalog, DashboardClient, MaintenanceInfo, MethodSchema, Plan, ResolvedDefinition, Schemas,
    ServiceBindingSchema, ServiceDefinition, ServiceInstanceSchema,
};
pub use context::RequestContext;
pub use error::{BrokerError, BrokerResult, ErrorMessage, FieldErrors};
pub use identity::{decode_originating_identity, Context, Properties};
pub use instance::{
    CreateServiceInstanceBody, CreateServiceInstanceRequest, CreateServiceInstanceResponse,
    DeleteServiceInstanceRequest, DeleteServiceInstanceResponse, GetLastServiceOperationRequest,
    GetServiceInstanceRequest, GetServiceInstanceResponse, UpdateServiceInstanceBody,
    UpdateServiceInstanceRequest, UpdateServiceInstanceResponse,
};
pub use operation::{LastOperationResponse, OperationKind, OperationState, MAX_OPERATION_LENGTH};
pub use service::{CatalogService, ServiceInstanceBindingService, ServiceInstanceService};
pub use version::{check_api_version, ExpectedApiVersion, ANY_VERSION, DEFAULT_VERSION_HEADER};

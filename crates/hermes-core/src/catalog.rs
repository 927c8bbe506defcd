//! Catalog document and service/plan resolution.
//!
//! The catalog is supplied by the broker implementation on every request;
//! this module only models it and resolves the service definition and plan a
//! request refers to. Resolution never mutates the catalog: the returned
//! definition is a copy whose `plans` are narrowed to the requested plan.

use crate::error::{BrokerError, BrokerResult};
use crate::identity::Properties;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The broker's catalog of service offerings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Service offerings, in the order they are advertised.
    pub services: Vec<ServiceDefinition>,
}

/// A service offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Identifier, unique within the catalog.
    pub id: String,
    /// CLI-friendly name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Whether instances of this service can be bound.
    pub bindable: bool,
    /// Whether instances can be moved between plans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_updateable: Option<bool>,
    /// Whether the broker supports fetching instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances_retrievable: Option<bool>,
    /// Whether the broker supports fetching bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings_retrievable: Option<bool>,
    /// Whether context updates are accepted on update requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_context_updates: Option<bool>,
    /// Tags describing the offering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Permissions the platform must grant (`syslog_drain`, `route_forwarding`, `volume_mount`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Properties>,
    /// Dashboard SSO client registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_client: Option<DashboardClient>,
    /// Plans offered by this service.
    pub plans: Vec<Plan>,
}

impl ServiceDefinition {
    /// Creates a bindable service definition without plans.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            bindable: true,
            plan_updateable: None,
            instances_retrievable: None,
            bindings_retrievable: None,
            allow_context_updates: None,
            tags: Vec::new(),
            requires: Vec::new(),
            metadata: None,
            dashboard_client: None,
            plans: Vec::new(),
        }
    }

    /// Appends a plan.
    #[must_use]
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plans.push(plan);
        self
    }

    /// Sets the bindable flag.
    #[must_use]
    pub fn with_bindable(mut self, bindable: bool) -> Self {
        self.bindable = bindable;
        self
    }

    /// Adds a required permission.
    #[must_use]
    pub fn with_requires(mut self, permission: impl Into<String>) -> Self {
        self.requires.push(permission.into());
        self
    }

    /// Finds a plan by id.
    pub fn plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == plan_id)
    }
}

/// A service plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Identifier, unique within its service definition.
    pub id: String,
    /// CLI-friendly name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Properties>,
    /// Whether the plan is free of charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free: Option<bool>,
    /// Overrides the service definition's bindable flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindable: Option<bool>,
    /// Overrides the service definition's plan_updateable flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_updateable: Option<bool>,
    /// Parameter schemas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Schemas>,
    /// Polling cutoff for asynchronous operations, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_polling_duration: Option<u64>,
    /// Maintenance information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_info: Option<MaintenanceInfo>,
}

impl Plan {
    /// Creates a plan with every optional field absent.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            metadata: None,
            free: None,
            bindable: None,
            plan_updateable: None,
            schemas: None,
            maximum_polling_duration: None,
            maintenance_info: None,
        }
    }

    /// Sets the free flag.
    #[must_use]
    pub fn with_free(mut self, free: bool) -> Self {
        self.free = Some(free);
        self
    }

    /// Sets the maintenance info.
    #[must_use]
    pub fn with_maintenance_info(mut self, info: MaintenanceInfo) -> Self {
        self.maintenance_info = Some(info);
        self
    }
}

/// JSON schemas for plan parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schemas {
    /// Schemas for instance operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_instance: Option<ServiceInstanceSchema>,
    /// Schemas for binding operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_binding: Option<ServiceBindingSchema>,
}

/// Instance create/update schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceSchema {
    /// Schema for provisioning parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<MethodSchema>,
    /// Schema for update parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<MethodSchema>,
}

/// Binding create schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBindingSchema {
    /// Schema for binding parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<MethodSchema>,
}

/// A JSON schema document for one operation's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSchema {
    /// The schema itself.
    pub parameters: Properties,
}

/// Maintenance information of a plan or instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceInfo {
    /// Semantic version of the maintenance state.
    pub version: String,
    /// What the maintenance update changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MaintenanceInfo {
    /// Creates maintenance info without a description.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: None,
        }
    }
}

/// Dashboard SSO client registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardClient {
    /// OAuth client id.
    pub id: String,
    /// OAuth client secret.
    pub secret: String,
    /// Redirect URI for the dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

/// A service definition narrowed to the plan a request refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefinition {
    /// The definition; `plans` holds only the resolved plan when one was requested.
    pub service_definition: ServiceDefinition,
    /// The resolved plan, if a plan id was requested.
    pub plan: Option<Plan>,
}

impl Catalog {
    /// Creates a catalog from service definitions.
    pub fn new(services: Vec<ServiceDefinition>) -> Self {
        Self { services }
    }

    /// Finds a service definition by id.
    pub fn service_definition(&self, service_id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|service| service.id == service_id)
    }

    /// Resolves a service definition and, when given, one of its plans.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::ServiceDefinitionNotFound`] when the service id is unknown
    /// - [`BrokerError::PlanNotFound`] when a plan id is given but not part of the service
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_core::{Catalog, Plan, ServiceDefinition};
    ///
    /// let catalog = Catalog::new(vec![
    ///     ServiceDefinition::new("svc", "db", "A database")
    ///         .with_plan(Plan::new("small", "small", "Small"))
    ///         .with_plan(Plan::new("large", "large", "Large")),
    /// ]);
    ///
    /// let resolved = catalog.resolve("svc", Some("large")).unwrap();
    /// assert_eq!(resolved.service_definition.plans.len(), 1);
    /// assert_eq!(resolved.plan.unwrap().id, "large");
    /// assert_eq!(catalog.services[0].plans.len(), 2);
    /// ```
    pub fn resolve(
        &self,
        service_id: &str,
        plan_id: Option<&str>,
    ) -> BrokerResult<ResolvedDefinition> {
        let service = self
            .service_definition(service_id)
            .ok_or_else(|| BrokerError::service_definition_not_found(service_id))?;

        let Some(plan_id) = plan_id else {
            return Ok(ResolvedDefinition {
                service_definition: service.clone(),
                plan: None,
            });
        };

        let plan = service
            .plan(plan_id)
            .cloned()
            .ok_or_else(|| BrokerError::plan_not_found(plan_id))?;

        let mut service_definition = ServiceDefinition {
            plans: Vec::with_capacity(1),
            ..service.clone()
        };
        service_definition.plans.push(plan.clone());

        Ok(ResolvedDefinition {
            service_definition,
            plan: Some(plan),
        })
    }

    /// Checks the structural rules of the document.
    ///
    /// Service ids must be unique, every service needs at least one plan,
    /// and plan ids must be unique within their service.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Internal`] naming the first violation.
    pub fn validate(&self) -> BrokerResult<()> {
        let mut service_ids = HashSet::new();
        for service in &self.services {
            if !service_ids.insert(service.id.as_str()) {
                return Err(BrokerError::internal(format!(
                    "catalog contains duplicate service id {}",
                    service.id
                )));
            }
            if service.plans.is_empty() {
                return Err(BrokerError::internal(format!(
                    "service {} has no plans",
                    service.id
                )));
            }
            let mut plan_ids = HashSet::new();
            for plan in &service.plans {
                if !plan_ids.insert(plan.id.as_str()) {
                    return Err(BrokerError::internal(format!(
                        "service {} contains duplicate plan id {}",
                        service.id, plan.id
                    )));
                }
            }
        }
        Ok(())
    }
}

//! Test fixtures for Hermes development and testing.
//!
//! Pre-built catalogs and identity contexts shared by the tests of every
//! Hermes crate.
//!
//! # Example
//!
//! ```
//! use hermes_core::fixtures;
//!
//! let catalog = fixtures::sample_catalog();
//! assert!(catalog.resolve(fixtures::SERVICE_ID, Some(fixtures::PLAN_ID)).is_ok());
//! ```

use crate::catalog::{Catalog, MaintenanceInfo, Plan, ServiceDefinition};
use crate::identity::{Context, Properties};
use serde_json::json;

/// Id of the bindable sample service.
pub const SERVICE_ID: &str = "service-one-id";

/// Id of the sample service's default plan.
pub const PLAN_ID: &str = "plan-one-id";

/// Id of the sample service's second plan.
pub const SECOND_PLAN_ID: &str = "plan-two-id";

/// Id of a sample service that cannot be bound.
pub const UNBINDABLE_SERVICE_ID: &str = "service-two-id";

/// Id of the unbindable service's plan.
pub const UNBINDABLE_PLAN_ID: &str = "plan-three-id";

/// Creates a catalog with two services and three plans.
///
/// ```
/// use hermes_core::fixtures::sample_catalog;
///
/// let catalog = sample_catalog();
/// assert_eq!(catalog.services.len(), 2);
/// assert!(catalog.validate().is_ok());
/// ```
#[must_use]
pub fn sample_catalog() -> Catalog {
    let mut metadata = Properties::new();
    metadata.insert("displayName".to_string(), json!("Service One"));

    let small = Plan::new(PLAN_ID, "small", "A small plan")
        .with_free(true)
        .with_maintenance_info(MaintenanceInfo::new("1.0.0"));
    let large = Plan::new(SECOND_PLAN_ID, "large", "A large plan").with_free(false);

    let mut service_one =
        ServiceDefinition::new(SERVICE_ID, "service-one", "A bindable sample service")
            .with_plan(small)
            .with_plan(large);
    service_one.metadata = Some(metadata);
    service_one.tags = vec!["sample".to_string()];

    let service_two = ServiceDefinition::new(
        UNBINDABLE_SERVICE_ID,
        "service-two",
        "An unbindable sample service",
    )
    .with_bindable(false)
    .with_requires("syslog_drain")
    .with_plan(Plan::new(UNBINDABLE_PLAN_ID, "only", "The only plan"));

    Catalog::new(vec![service_one, service_two])
}

/// Creates a Cloud Foundry identity context.
#[must_use]
pub fn cloud_foundry_context() -> Context {
    let mut properties = Properties::new();
    properties.insert("organization_guid".to_string(), json!("org-guid"));
    properties.insert("space_guid".to_string(), json!("space-guid"));
    properties.insert("user_id".to_string(), json!("user-guid"));
    Context::CloudFoundry { properties }
}

/// Creates a Kubernetes identity context.
#[must_use]
pub fn kubernetes_context() -> Context {
    let mut properties = Properties::new();
    properties.insert("namespace".to_string(), json!("default"));
    properties.insert("clusterid".to_string(), json!("cluster-1"));
    Context::Kubernetes { properties }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_resolves() {
        let catalog = sample_catalog();
        let resolved = catalog.resolve(SERVICE_ID, Some(SECOND_PLAN_ID)).unwrap();
        assert_eq!(resolved.service_definition.plans.len(), 1);
        assert!(catalog.resolve(UNBINDABLE_SERVICE_ID, Some(UNBINDABLE_PLAN_ID)).is_ok());
    }

    #[test]
    fn test_contexts_survive_header_encoding() {
        for context in [cloud_foundry_context(), kubernetes_context()] {
            let decoded = crate::decode_originating_identity(&context.to_header_value()).unwrap();
            assert_eq!(decoded, context);
        }
    }
}

//! Request scope types.
//!
//! The [`RequestContext`] carries the request-scoped fields every broker
//! operation receives: the platform instance the request was routed to,
//! the API info location, the decoded originating identity, and the
//! platform's request id.

use crate::identity::Context;
use serde::{Deserialize, Serialize};

/// Request-scoped fields attached to every operation request.
///
/// All fields are optional. They are copied verbatim from the incoming
/// request before catalog resolution and before the broker is invoked.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_platform_instance_id(Some("cf-east".to_string()))
///     .with_request_id(Some("req-42".to_string()));
///
/// assert_eq!(ctx.platform_instance_id(), Some("cf-east"));
/// assert_eq!(ctx.request_id(), Some("req-42"));
/// assert!(ctx.originating_identity().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Platform instance the request was scoped to by its path.
    #[serde(skip_serializing_if = "Option::is_none")]
    platform_instance_id: Option<String>,

    /// Location of the platform's API info endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    api_info_location: Option<String>,

    /// Decoded originating identity header.
    #[serde(skip_serializing_if = "Option::is_none")]
    originating_identity: Option<Context>,

    /// Request id sent by the platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl RequestContext {
    /// Creates an empty request context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the platform instance id; an empty id means no scoping.
    #[must_use]
    pub fn with_platform_instance_id(mut self, id: Option<String>) -> Self {
        self.platform_instance_id = id.filter(|id| !id.is_empty());
        self
    }

    /// Sets the API info location.
    #[must_use]
    pub fn with_api_info_location(mut self, location: Option<String>) -> Self {
        self.api_info_location = location;
        self
    }

    /// Sets the originating identity.
    #[must_use]
    pub fn with_originating_identity(mut self, identity: Option<Context>) -> Self {
        self.originating_identity = identity;
        self
    }

    /// Sets the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the platform instance id.
    #[must_use]
    pub fn platform_instance_id(&self) -> Option<&str> {
        self.platform_instance_id.as_deref()
    }

    /// Returns the API info location.
    #[must_use]
    pub fn api_info_location(&self) -> Option<&str> {
        self.api_info_location.as_deref()
    }

    /// Returns the decoded originating identity.
    #[must_use]
    pub fn originating_identity(&self) -> Option<&Context> {
        self.originating_identity.as_ref()
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Properties;
    use serde_json::json;

    #[test]
    fn test_empty_platform_instance_id_is_unscoped() {
        let ctx = RequestContext::new().with_platform_instance_id(Some(String::new()));
        assert!(ctx.platform_instance_id().is_none());
    }

    #[test]
    fn test_fields_are_kept_verbatim() {
        let mut properties = Properties::new();
        properties.insert("user_id".to_string(), json!("u-1"));
        let identity = Context::from_parts("acme", properties).unwrap();

        let ctx = RequestContext::new()
            .with_platform_instance_id(Some("p-1".to_string()))
            .with_api_info_location(Some("api.example.com/v2/info".to_string()))
            .with_originating_identity(Some(identity.clone()))
            .with_request_id(Some(" spaced id ".to_string()));

        assert_eq!(ctx.platform_instance_id(), Some("p-1"));
        assert_eq!(ctx.api_info_location(), Some("api.example.com/v2/info"));
        assert_eq!(ctx.originating_identity(), Some(&identity));
        assert_eq!(ctx.request_id(), Some(" spaced id "));
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let ctx = RequestContext::new().with_request_id(Some("r".to_string()));
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"request_id":"r"}"#);
    }
}

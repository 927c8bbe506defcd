//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries state through the middleware pipeline.
//! Each stage records what it extracted from the request headers; once the
//! router has matched a path the server turns it into the immutable
//! [`RequestContext`] attached to the operation request.

use hermes_core::{Context, RequestContext};
use std::time::{Duration, Instant};

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use hermes_middleware::context::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_request_id("req-1".to_string());
/// ctx.set_api_info_location("api.example.com/v2/info".to_string());
///
/// let scope = ctx.request_context(Some("platform-a".to_string()));
/// assert_eq!(scope.request_id(), Some("req-1"));
/// assert_eq!(scope.platform_instance_id(), Some("platform-a"));
/// ```
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    /// Request id sent by the platform.
    request_id: Option<String>,

    /// Location of the platform's API info endpoint.
    api_info_location: Option<String>,

    /// Decoded originating identity.
    originating_identity: Option<Context>,

    /// When the request entered the pipeline.
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: None,
            api_info_location: None,
            originating_identity: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request id, if the platform sent one.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Sets the request id.
    ///
    /// This should only be called by the request id stage.
    pub fn set_request_id(&mut self, request_id: String) {
        self.request_id = Some(request_id);
    }

    /// Returns the API info location.
    #[must_use]
    pub fn api_info_location(&self) -> Option<&str> {
        self.api_info_location.as_deref()
    }

    /// Sets the API info location.
    pub fn set_api_info_location(&mut self, location: String) {
        self.api_info_location = Some(location);
    }

    /// Returns the decoded originating identity.
    #[must_use]
    pub fn originating_identity(&self) -> Option<&Context> {
        self.originating_identity.as_ref()
    }

    /// Sets the originating identity.
    ///
    /// This should only be called by the originating identity stage.
    pub fn set_originating_identity(&mut self, identity: Context) {
        self.originating_identity = Some(identity);
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Builds the request scope handed to broker operations.
    #[must_use]
    pub fn request_context(&self, platform_instance_id: Option<String>) -> RequestContext {
        RequestContext::new()
            .with_platform_instance_id(platform_instance_id)
            .with_api_info_location(self.api_info_location.clone())
            .with_originating_identity(self.originating_identity.clone())
            .with_request_id(self.request_id.clone())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = MiddlewareContext::new();
        assert!(ctx.request_id().is_none());
        assert!(ctx.api_info_location().is_none());
        assert!(ctx.originating_identity().is_none());
    }

    #[test]
    fn test_request_context_carries_everything() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_request_id("r".to_string());
        ctx.set_originating_identity(fixtures::kubernetes_context());

        let scope = ctx.request_context(None);
        assert_eq!(scope.request_id(), Some("r"));
        assert_eq!(
            scope.originating_identity().and_then(Context::namespace),
            Some("default")
        );
        assert!(scope.platform_instance_id().is_none());
        assert!(scope.api_info_location().is_none());
    }

    #[test]
    fn test_elapsed_time() {
        let ctx = MiddlewareContext::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(5));
        assert!(ctx.started_at() <= Instant::now());
    }
}

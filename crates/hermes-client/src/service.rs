//! Backend services and their request policies.

use hermes_config::ServiceUrls;
use hermes_middleware::stages::{RequestShapingMiddleware, HAL_JSON, JSON};

pub use hermes_middleware::stages::resolve_url;

/// A backend service with its own API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Authentication: tokens, users, organizations, roles.
    Auth,
    /// Main deploy API: apps, databases, environments, endpoints.
    Api,
    /// Billing.
    Billing,
    /// Metrics tunnel.
    MetricTunnel,
    /// Support portal.
    Portal,
    /// AI assistant.
    Ai,
}

impl ServiceKind {
    /// Returns every service.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Auth,
            Self::Api,
            Self::Billing,
            Self::MetricTunnel,
            Self::Portal,
            Self::Ai,
        ]
    }

    /// Returns the logical service name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Billing => "billing",
            Self::MetricTunnel => "metrictunnel",
            Self::Portal => "portal",
            Self::Ai => "aptibleai",
        }
    }

    /// Looks a service up by logical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.name() == name)
    }

    /// Returns the configured base URL of the service.
    #[must_use]
    pub fn base_url(self, urls: &ServiceUrls) -> &str {
        match self {
            Self::Auth => &urls.auth,
            Self::Api => &urls.api,
            Self::Billing => &urls.billing,
            Self::MetricTunnel => &urls.metric_tunnel,
            Self::Portal => &urls.portal,
            Self::Ai => &urls.aptible_ai,
        }
    }

    /// Returns the request content type.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Auth | Self::Api | Self::Billing => HAL_JSON,
            Self::MetricTunnel | Self::Portal | Self::Ai => JSON,
        }
    }

    /// Returns true if callers may pick the credentials mode per request.
    #[must_use]
    pub const fn allows_credentials_override(self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Returns true if the client runs the elevated-token stage.
    #[must_use]
    pub const fn uses_elevated_token(self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Builds the request-shaping stage for this service.
    #[must_use]
    pub fn request_shaping(self, base_url: impl Into<String>) -> RequestShapingMiddleware {
        let stage = RequestShapingMiddleware::new(base_url, self.content_type());
        if self.allows_credentials_override() {
            stage.with_credentials_override()
        } else {
            stage
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ServiceKind::all() {
            assert_eq!(ServiceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ServiceKind::from_name("deploy"), None);
    }

    #[test]
    fn test_base_urls_come_from_config() {
        let urls = ServiceUrls {
            metric_tunnel: "https://metrics.example.test".to_string(),
            aptible_ai: "https://ai.example.test".to_string(),
            ..ServiceUrls::default()
        };
        assert_eq!(ServiceKind::MetricTunnel.base_url(&urls), "https://metrics.example.test");
        assert_eq!(ServiceKind::Ai.base_url(&urls), "https://ai.example.test");
        assert_eq!(ServiceKind::Api.base_url(&urls), urls.api);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ServiceKind::Api.content_type(), HAL_JSON);
        assert_eq!(ServiceKind::Auth.content_type(), HAL_JSON);
        assert_eq!(ServiceKind::Billing.content_type(), HAL_JSON);
        assert_eq!(ServiceKind::MetricTunnel.content_type(), JSON);
        assert_eq!(ServiceKind::Portal.content_type(), JSON);
        assert_eq!(ServiceKind::Ai.content_type(), JSON);
    }

    #[test]
    fn test_only_auth_is_special() {
        for kind in ServiceKind::all() {
            assert_eq!(kind.allows_credentials_override(), kind == ServiceKind::Auth);
            assert_eq!(kind.uses_elevated_token(), kind == ServiceKind::Auth);
        }
    }

    #[test]
    fn test_resolve_url_reexport() {
        assert_eq!(resolve_url("https://auth.test", "/tokens"), "https://auth.test/tokens");
    }
}

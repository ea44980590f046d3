//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// Deployment environment the client runs against.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development stack.
    #[default]
    Development,
    /// Automated test runs.
    Test,
    /// Production.
    Production,
}

impl Environment {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Base URLs of the backend services.
///
/// # Example
///
/// ```
/// use hermes_config::ServiceUrls;
///
/// let urls = ServiceUrls::default();
/// assert_eq!(urls.api, "http://localhost:4000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceUrls {
    /// Authentication service.
    #[serde(default = "default_auth_url")]
    pub auth: String,

    /// Main resource API.
    #[serde(default = "default_api_url")]
    pub api: String,

    /// Billing service.
    #[serde(default = "default_billing_url")]
    pub billing: String,

    /// Metrics tunnel.
    #[serde(default = "default_metric_tunnel_url")]
    pub metric_tunnel: String,

    /// Support portal.
    #[serde(default = "default_portal_url")]
    pub portal: String,

    /// AI assistant service.
    #[serde(default = "default_aptible_ai_url")]
    pub aptible_ai: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            auth: default_auth_url(),
            api: default_api_url(),
            billing: default_billing_url(),
            metric_tunnel: default_metric_tunnel_url(),
            portal: default_portal_url(),
            aptible_ai: default_aptible_ai_url(),
        }
    }
}

impl ServiceUrls {
    /// Returns every URL with its field name.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("auth", &self.auth),
            ("api", &self.api),
            ("billing", &self.billing),
            ("metric_tunnel", &self.metric_tunnel),
            ("portal", &self.portal),
            ("aptible_ai", &self.aptible_ai),
        ]
    }
}

fn default_auth_url() -> String {
    "http://localhost:4001".to_string()
}

fn default_api_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_billing_url() -> String {
    "http://localhost:4004".to_string()
}

fn default_metric_tunnel_url() -> String {
    "http://localhost:4005".to_string()
}

fn default_portal_url() -> String {
    "http://localhost:4006".to_string()
}

fn default_aptible_ai_url() -> String {
    "http://localhost:4007".to_string()
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_connect_timeout() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    concat!("hermes/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Pagination fan-out limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Upper bound on pages fetched by one paginated call.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

fn default_max_pages() -> u32 {
    50
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

impl LogFormat {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Persisted client state location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PersistenceConfig {
    /// State file path. None disables persistence.
    #[serde(default)]
    pub path: Option<String>,

    /// Versioned top-level key of the state document.
    #[serde(default = "default_root_key")]
    pub root_key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: None,
            root_key: default_root_key(),
        }
    }
}

fn default_root_key() -> String {
    "hermes-v1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Test".parse::<Environment>(), Ok(Environment::Test));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_section_defaults() {
        assert_eq!(PaginationConfig::default().max_pages, 50);
        assert_eq!(PersistenceConfig::default().root_key, "hermes-v1");
        assert!(HttpConfig::default().user_agent.starts_with("hermes/"));
    }

    #[test]
    fn test_service_urls_partial_toml() {
        let urls: ServiceUrls = toml::from_str(r#"api = "https://api.example.test""#).unwrap();
        assert_eq!(urls.api, "https://api.example.test");
        assert_eq!(urls.auth, default_auth_url());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<PaginationConfig, _> = toml::from_str("max_page = 3");
        assert!(result.is_err());
    }
}

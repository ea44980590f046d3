//! Main configuration types.
//!
//! This module provides the top-level [`HermesConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, Environment, HttpConfig, LogFormat, LoggingConfig, PaginationConfig,
    PersistenceConfig, ServiceUrls,
};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete Hermes client configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.pagination.max_pages, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Service base URLs.
    #[serde(default)]
    pub services: ServiceUrls,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Pagination limits.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Persisted state settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl HermesConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, PaginationConfig};
    ///
    /// let config = HermesConfig::builder()
    ///     .pagination(PaginationConfig { max_pages: 3 })
    ///     .build();
    ///
    /// assert_eq!(config.pagination.max_pages, 3);
    /// ```
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A service URL is not an absolute http(s) URL
    /// - A timeout is zero
    /// - `pagination.max_pages` is zero
    /// - The log level is unknown
    /// - The persistence root key is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in self.services.entries() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid_value(
                    format!("services.{field}"),
                    format!("expected an absolute http(s) URL, got '{url}'"),
                ));
            }
        }

        if self.http.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "http.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.http.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "http.connect_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.pagination.max_pages == 0 {
            return Err(ConfigError::invalid_value(
                "pagination.max_pages",
                "must be at least 1",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        if self.persistence.root_key.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "persistence.root_key",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logs against the local service stack.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.environment = Environment::Development;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Create a test configuration preset.
    ///
    /// Quiet logs, short timeouts and no persistence.
    #[must_use]
    pub fn test() -> Self {
        let mut config = Self::default();
        config.environment = Environment::Test;
        config.logging.level = "warn".to_string();
        config.logging.format = LogFormat::Pretty;
        config.http.request_timeout_ms = 5_000;
        config.http.connect_timeout_ms = 1_000;
        config.persistence.path = None;
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::production();
    /// assert_eq!(config.logging.format, hermes_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.environment = Environment::Production;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    environment: Option<Environment>,
    services: Option<ServiceUrls>,
    http: Option<HttpConfig>,
    pagination: Option<PaginationConfig>,
    logging: Option<LoggingConfig>,
    persistence: Option<PersistenceConfig>,
}

impl HermesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the environment.
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Set the service URLs.
    #[must_use]
    pub fn services(mut self, services: ServiceUrls) -> Self {
        self.services = Some(services);
        self
    }

    /// Set the HTTP configuration.
    #[must_use]
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = Some(http);
        self
    }

    /// Set the pagination configuration.
    #[must_use]
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the persistence configuration.
    #[must_use]
    pub fn persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        HermesConfig {
            environment: self.environment.unwrap_or_default(),
            services: self.services.unwrap_or_default(),
            http: self.http.unwrap_or_default(),
            pagination: self.pagination.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            persistence: self.persistence.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<HermesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HermesConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(HermesConfig::development().validate().is_ok());
        assert!(HermesConfig::test().validate().is_ok());
        assert!(HermesConfig::production().validate().is_ok());
        assert_eq!(HermesConfig::test().environment, Environment::Test);
    }

    #[test]
    fn test_builder_sections() {
        let config = HermesConfig::builder()
            .environment(Environment::Production)
            .services(ServiceUrls {
                api: "https://api.example.test".to_string(),
                ..Default::default()
            })
            .persistence(PersistenceConfig {
                path: Some("/tmp/hermes.json".to_string()),
                ..Default::default()
            })
            .build();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.services.api, "https://api.example.test");
        assert_eq!(config.persistence.root_key, "hermes-v1");
        assert_eq!(config.pagination.max_pages, 50);
    }

    #[test]
    fn test_validate_relative_service_url() {
        let result = HermesConfig::builder()
            .services(ServiceUrls {
                billing: "billing.local".to_string(),
                ..Default::default()
            })
            .build_validated();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("services.billing"));
    }

    #[test]
    fn test_validate_zero_max_pages() {
        let result = HermesConfig::builder()
            .pagination(PaginationConfig { max_pages: 0 })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("max_pages"));
    }

    #[test]
    fn test_validate_unknown_log_level() {
        let result = HermesConfig::builder()
            .logging(LoggingConfig {
                level: "verbose".to_string(),
                ..Default::default()
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_validate_empty_root_key() {
        let result = HermesConfig::builder()
            .persistence(PersistenceConfig {
                path: None,
                root_key: " ".to_string(),
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("root_key"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let result = HermesConfig::builder()
            .http(HttpConfig {
                request_timeout_ms: 0,
                ..Default::default()
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("request_timeout_ms"));
    }
}

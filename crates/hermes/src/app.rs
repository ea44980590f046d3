//! Application wiring.

use std::sync::Arc;

use hermes_client::{Clients, HttpTransport};
use hermes_config::{HermesConfig, LoggingConfig};
use hermes_core::persist::{load_state, save_state};
use hermes_core::{HermesError, HermesResult, Store, Transport};
use hermes_telemetry::{init_logging, ErrorReporter, LogConfig, LogReporter};

/// Maps the logging section of the configuration to a [`LogConfig`].
///
/// # Errors
///
/// Returns [`HermesError::Config`] for an unknown format.
pub fn log_config(logging: &LoggingConfig) -> HermesResult<LogConfig> {
    LogConfig::from_parts(&logging.level, logging.format.as_str())
        .map_err(|e| HermesError::config(e.to_string()))
}

/// Installs the global subscriber described by `config.logging`.
///
/// # Errors
///
/// Returns [`HermesError::Config`] if the section is invalid or a global
/// subscriber is already installed.
pub fn init_logging_from(config: &HermesConfig) -> HermesResult<()> {
    init_logging(&log_config(&config.logging)?).map_err(|e| HermesError::config(e.to_string()))
}

/// A configured client: the store, the six service clients and
/// persistence.
pub struct Hermes {
    config: HermesConfig,
    clients: Clients,
}

impl std::fmt::Debug for Hermes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hermes")
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}

impl Hermes {
    /// Builds clients over HTTP, restoring persisted state if a persistence
    /// path is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the HTTP client
    /// cannot be built or persisted state cannot be read.
    pub fn new(config: HermesConfig) -> HermesResult<Self> {
        let transport = Arc::new(HttpTransport::new(&config.http)?);
        Self::with_transport(config, transport, Arc::new(LogReporter))
    }

    /// Builds clients over the given transport and reporter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or persisted state
    /// cannot be read.
    pub fn with_transport(
        config: HermesConfig,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> HermesResult<Self> {
        config
            .validate()
            .map_err(|e| HermesError::config(e.to_string()))?;

        let store = Store::new();
        if let Some(path) = &config.persistence.path {
            if let Some(persisted) = load_state(path, &config.persistence.root_key)? {
                store.hydrate(persisted);
                tracing::info!(path = %path, "restored persisted state");
            }
        }

        let clients = Clients::new(&config, store, transport, reporter)?;
        tracing::info!(
            environment = config.environment.as_str(),
            api = %config.services.api,
            "hermes ready"
        );
        Ok(Self { config, clients })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &HermesConfig {
        &self.config
    }

    /// Returns the service clients.
    #[must_use]
    pub const fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Returns the shared store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        self.clients.store()
    }

    /// Writes tokens and UI state to the persistence path. Does nothing
    /// without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn persist(&self) -> HermesResult<()> {
        match &self.config.persistence.path {
            Some(path) => save_state(path, &self.config.persistence.root_key, self.store()),
            None => Ok(()),
        }
    }

    /// Logs out: resets the store, aborting calls in flight, and persists
    /// the cleared state.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleared state cannot be written.
    pub fn logout(&self) -> HermesResult<()> {
        self.clients.reset();
        self.persist()
    }
}

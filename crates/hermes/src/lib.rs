//! # Hermes
//!
//! **API client for the Themis dashboard**
//!
//! Hermes talks to the dashboard's backend services through one fixed
//! middleware pipeline:
//!
//! - 🔗 **Fixed pipeline** – tracing, error boundary, loaders, abort race, auth and fetch in a set order
//! - 🔑 **Session handling** – bearer and elevated tokens, expired sessions cleared automatically
//! - 📄 **Pagination** – every page of a HAL collection, fetched concurrently after the first
//! - 💰 **Cost estimates** – monthly pricing of services, disks, endpoints and backups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hermes::prelude::*;
//!
//! # async fn demo() -> HermesResult<()> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .and_then(|loader| loader.with_env_prefix("HERMES").load())
//!     .map_err(|e| HermesError::config(e.to_string()))?;
//! hermes::init_logging_from(&config)?;
//!
//! let app = Hermes::new(config)?;
//! let ctx = app
//!     .clients()
//!     .auth()
//!     .call(catalog::CREATE_TOKEN, serde_json::json!({ "username": "ops", "password": "..." }))
//!     .await;
//!
//! if ctx.is_ok() {
//!     if let Ok(apps) = catalog::fetch_all_apps(app.clients().api()).await {
//!         println!("{} pages of apps", apps.len());
//!     }
//!     app.persist()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! call → Trace → ErrorBoundary → ResetJson → Loader → ExpiredToken → AbortRace
//!      → RequestShaping → HalParser → Router → BearerToken → [ElevatedToken] → Fetch
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{init_logging_from, log_config, Hermes};

// Re-export core types
pub use hermes_core as core;

// Re-export middleware types
pub use hermes_middleware as middleware;

// Re-export service clients
pub use hermes_client as client;

// Re-export the cost estimator
pub use hermes_cost as cost;

// Re-export configuration
pub use hermes_config as config;

// Re-export telemetry
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hermes::prelude::*;
///
/// let inputs = CostInputs::new().endpoints(1);
/// assert!(estimate_monthly_cost(&inputs, &CostRates::default()) > 0.0);
/// ```
pub mod prelude {
    pub use crate::app::Hermes;

    pub use hermes_core::{
        Action, ApiCtx, ApiFailure, Credentials, FetchJson, HermesError, HermesResult, LoaderState,
        LoaderStatus, Store, Token, Transport,
    };

    pub use hermes_middleware::{Middleware, Next, Pipeline, Stage};

    pub use hermes_client::{
        catalog, combine_pages, ApiClient, Clients, CombinedPages, Endpoint, ServiceKind,
    };

    pub use hermes_cost::{
        estimate_monthly_cost, format_currency, CostBreakdown, CostInputs, CostRates,
        CostSelector, DiskInput, ServiceInput,
    };

    pub use hermes_config::{ConfigLoader, Environment, HermesConfig};

    pub use hermes_telemetry::{ErrorReporter, LogReporter};
}

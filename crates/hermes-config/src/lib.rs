//! # Hermes Config
//!
//! Typed configuration for the Hermes API client.
//!
//! Configuration is layered: defaults or a preset, then a TOML/JSON file,
//! then `HERMES__SECTION__KEY` environment variables. Unknown fields are
//! rejected at parse time and the result is validated before use.
//!
//! ## Example
//!
//! ```
//! use hermes_config::{ConfigLoader, Environment};
//!
//! let config = ConfigLoader::new()
//!     .with_string(r#"environment = "test""#, "toml")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.environment, Environment::Test);
//! ```
//!
//! ## Environment Variables
//!
//! - `HERMES__SERVICES__API=https://api.example.test`
//! - `HERMES__PAGINATION__MAX_PAGES=10`
//! - `HERMES__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;

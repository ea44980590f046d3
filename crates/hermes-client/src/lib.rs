//! # Hermes Client
//!
//! API clients for every backend service of the dashboard.
//!
//! Each [`ApiClient`] runs its calls through the same fixed-order pipeline
//! from `hermes-middleware`; services differ only in base URL, content type
//! and their [`Endpoint`]s. [`Clients`] assembles all six over one shared
//! [`Store`](hermes_core::Store).
//!
//! ## Example
//!
//! ```no_run
//! use hermes_client::{catalog, Clients};
//! use hermes_config::HermesConfig;
//! use hermes_core::Store;
//!
//! # async fn demo() -> hermes_core::HermesResult<()> {
//! let clients = Clients::from_config(&HermesConfig::development(), Store::new())?;
//!
//! match catalog::fetch_all_apps(clients.api()).await {
//!     Ok(pages) => println!("{} pages", pages.len()),
//!     Err(failure) => eprintln!("could not load apps: {}", failure.message),
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
pub mod catalog;
mod endpoint;
pub mod pagination;
mod service;
mod transport;

pub use api::{ApiClient, ApiClientBuilder, Clients};
pub use endpoint::{Endpoint, PostProcessor};
pub use pagination::{combine_pages, CombinedPages, PageInfo, DEFAULT_MAX_PAGES};
pub use service::{resolve_url, ServiceKind};
pub use transport::HttpTransport;

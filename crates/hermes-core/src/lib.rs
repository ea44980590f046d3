//! # Hermes Core
//!
//! Core types shared by every Hermes crate.
//!
//! - [`ApiCtx`] - Per-call context threaded through the middleware chain
//! - [`RequestId`] - UUID v7 identifier of one pipeline invocation
//! - [`Store`] - The single shared state container, written through [`Action`]s
//! - [`AbortSignal`] - Store-held signal that cancels in-flight calls
//! - [`Transport`] - The seam between the pipeline and the network
//! - [`HermesError`] - Exception-path errors (domain errors are values, see [`ApiFailure`])

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod loader;
pub mod persist;
mod request;
mod signal;
mod store;

pub use context::{redact, ApiCtx, RequestId, REDACTED_KEYS};
pub use error::{is_benign_message, HermesError, HermesResult, BENIGN_PATTERNS};
pub use loader::{LoaderState, LoaderStatus};
pub use request::{
    ApiFailure, BoxFuture, Credentials, FetchJson, FetchRequest, FetchResponse, Transport,
};
pub use signal::AbortSignal;
pub use store::{Action, FeedbackState, StoreState, Store, Theme, Token, UiState};

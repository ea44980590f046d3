//! Pipeline stages.
//!
//! One module per [`Stage`](crate::pipeline::Stage), in pipeline order:
//!
//! 1. [`trace`] - Debug logs and call metrics
//! 2. [`error_boundary`] - Benign errors dropped, others reported once
//! 3. [`reset_json`] - Stale outcome cleared
//! 4. [`loader`] - Loader bookkeeping
//! 5. [`expired_token`] - GET + 401 clears the session token
//! 6. [`abort_race`] - Store abort signal races the rest of the chain
//! 7. [`request_shaping`] - Base URL, credentials, content type
//! 8. [`hal`] - HAL entities upserted into the store
//! 9. [`router`] - Endpoint dispatch
//! 10. [`bearer_token`] - Access token, and elevated token on the auth client
//! 11. [`fetch`] - Network call

pub mod abort_race;
pub mod bearer_token;
pub mod error_boundary;
pub mod expired_token;
pub mod fetch;
pub mod hal;
pub mod loader;
pub mod request_shaping;
pub mod reset_json;
pub mod router;
pub mod trace;

pub use abort_race::AbortRaceMiddleware;
pub use bearer_token::{BearerTokenMiddleware, ElevatedTokenMiddleware};
pub use error_boundary::ErrorBoundaryMiddleware;
pub use expired_token::ExpiredTokenMiddleware;
pub use fetch::{fill_params, FetchMiddleware};
pub use hal::{extract_entities, HalParserMiddleware};
pub use loader::LoaderMiddleware;
pub use request_shaping::{resolve_url, RequestShapingMiddleware, HAL_JSON, JSON};
pub use reset_json::ResetJsonMiddleware;
pub use router::RouterMiddleware;
pub use trace::TraceMiddleware;

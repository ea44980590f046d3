//! # Hermes Middleware
//!
//! The fixed-order request pipeline every Hermes API client runs its calls
//! through.
//!
//! ## Pipeline Stages
//!
//! ```text
//! call → Trace → ErrorBoundary → ResetJson → Loader → ExpiredToken → AbortRace
//!                                                                       ↓
//!          Fetch ← ElevatedToken ← BearerToken ← Router ← HalParser ← RequestShaping
//! ```
//!
//! Stages run in order on the way in and in reverse on the way out. The
//! order is fixed by [`Stage`]: credential decoration always precedes the
//! fetch, and the abort race always wraps it.
//!
//! ## Example
//!
//! ```
//! use hermes_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 12);
//! assert_eq!(stages[0].name(), "trace");
//! assert_eq!(stages[11].name(), "fetch");
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, Stage};

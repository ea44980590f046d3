//! Logging, metrics and error reporting for Hermes.
//!
//! - **Logging**: structured JSON or pretty output through `tracing-subscriber`
//! - **Metrics**: request counters and latency histograms through the `metrics` crate
//! - **Error reporting**: the [`ErrorReporter`] seam the error boundary reports to
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_requests_total` | Counter | `endpoint`, `outcome` | Completed pipeline runs |
//! | `hermes_request_duration_seconds` | Histogram | `endpoint` | Pipeline latency |
//! | `hermes_errors_reported_total` | Counter | `code` | Errors sent to the reporter |
//! | `hermes_pages_fetched_total` | Counter | `endpoint` | Pages fetched by pagination fan-out |
//!
//! No recorder is installed here. Applications pick one (for example a
//! Prometheus exporter) and the counters start flowing.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(endpoint = "fetch-apps", "dashboard started");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;
pub mod reporter;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use reporter::{ErrorReport, ErrorReporter, FnReporter, LogReporter, NoopReporter};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

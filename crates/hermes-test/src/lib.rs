//! # Hermes Test
//!
//! Test utilities for Hermes: exercise whole pipelines without a network.
//!
//! - [`MockTransport`] - scripted [`Transport`](hermes_core::Transport) that records every request
//! - [`RecordingReporter`] - [`ErrorReporter`](hermes_telemetry::ErrorReporter) that keeps what it receives
//! - [`fixtures`] - HAL pages, entities and tokens
//! - [`MetricsCapture`] - local metrics recorder for asserting on labels
//!
//! ## Example
//!
//! ```
//! use hermes_core::{FetchRequest, Transport};
//! use hermes_test::MockTransport;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new();
//! transport.on_json("GET", "/apps", StatusCode::OK, json!({ "_embedded": { "apps": [] } }));
//!
//! let response = transport
//!     .send(FetchRequest::get("https://api.test/apps"))
//!     .await
//!     .unwrap();
//! assert_eq!(response.status, StatusCode::OK);
//! assert_eq!(transport.request_count(), 1);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
mod metrics;
mod reporter;
mod transport;

pub use metrics::{CapturedMetric, MetricsCapture};
pub use reporter::RecordingReporter;
pub use transport::{MockRoute, MockTransport};

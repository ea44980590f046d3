//! Standard Hermes metrics.
//!
//! Recording goes through the `metrics` facade. Without an installed
//! recorder every call is a no-op, so library code records unconditionally.
//!
//! # Example
//!
//! ```
//! use hermes_telemetry::metrics::{record_call, CallOutcome};
//! use std::time::Duration;
//!
//! record_call("fetch-apps", CallOutcome::Ok, Duration::from_millis(45));
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Completed pipeline runs.
pub const REQUESTS_TOTAL: &str = "hermes_requests_total";
/// Pipeline latency in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "hermes_request_duration_seconds";
/// Errors handed to the error reporter.
pub const ERRORS_REPORTED_TOTAL: &str = "hermes_errors_reported_total";
/// Pages fetched by pagination fan-out.
pub const PAGES_FETCHED_TOTAL: &str = "hermes_pages_fetched_total";

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallOutcome {
    /// 2xx answer.
    Ok,
    /// Domain failure (non-2xx answer).
    Failure,
    /// The abort signal won the race.
    Aborted,
    /// No outcome was produced (exception swallowed by the boundary).
    Empty,
}

impl CallOutcome {
    /// Label value for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
            Self::Empty => "empty",
        }
    }
}

/// Registers descriptions for all standard metrics.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of API calls run through a pipeline");
    describe_histogram!(REQUEST_DURATION_SECONDS, "API call duration in seconds");
    describe_counter!(ERRORS_REPORTED_TOTAL, "Errors reported by the error boundary");
    describe_counter!(PAGES_FETCHED_TOTAL, "Pages fetched by combine_pages");
}

/// Reduces an endpoint name to a bounded label value.
///
/// Route names keep their method and template. Concrete path segments
/// (any segment with a digit) become `:id`, and host, query and anything
/// after a `|` are dropped, so ids and payloads never mint new series.
///
/// ```
/// use hermes_telemetry::metrics::endpoint_label;
///
/// assert_eq!(endpoint_label("GET /databases/:id/operations"), "GET /databases/:id/operations");
/// assert_eq!(endpoint_label("GET /stacks/42?page=2"), "GET /stacks/:id");
/// assert_eq!(endpoint_label("GET /apps [all-pages]|{\"id\":\"9\"}"), "GET /apps [all-pages]");
/// ```
#[must_use]
pub fn endpoint_label(name: &str) -> String {
    let name = name.split('|').next().unwrap_or_default().trim_end();
    let (method, rest) = name.split_once(' ').unwrap_or(("", name));
    let (route, suffix) = rest.split_once(' ').unwrap_or((rest, ""));

    let path = match route.find("://") {
        Some(scheme) => {
            let after = &route[scheme + 3..];
            after.find('/').map_or("/", |slash| &after[slash..])
        }
        None if route.starts_with('/') => route,
        None => return name.to_string(),
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let template: Vec<&str> = path
        .split('/')
        .map(|segment| {
            if !segment.starts_with(':') && segment.bytes().any(|b| b.is_ascii_digit()) {
                ":id"
            } else {
                segment
            }
        })
        .collect();

    let mut label = String::with_capacity(name.len());
    if !method.is_empty() {
        label.push_str(method);
        label.push(' ');
    }
    label.push_str(&template.join("/"));
    if !suffix.is_empty() {
        label.push(' ');
        label.push_str(suffix);
    }
    label
}

/// Records a completed call.
pub fn record_call(endpoint: &str, outcome: CallOutcome, duration: Duration) {
    let endpoint = endpoint_label(endpoint);
    counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint.clone(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
        .record(duration.as_secs_f64());
}

/// Records one report sent to the error reporter.
pub fn record_error_reported(code: &str) {
    counter!(ERRORS_REPORTED_TOTAL, "code" => code.to_string()).increment(1);
}

/// Records pages fetched by a pagination run.
pub fn record_pages_fetched(endpoint: &str, pages: u64) {
    counter!(PAGES_FETCHED_TOTAL, "endpoint" => endpoint_label(endpoint)).increment(pages);
}

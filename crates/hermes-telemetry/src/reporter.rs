//! Error reporting seam.
//!
//! The pipeline's error boundary hands every unexpected exception to an
//! [`ErrorReporter`] exactly once, together with a JSON snapshot of the
//! request context. Applications plug in their crash reporting service;
//! [`LogReporter`] is the default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One reported error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Display text of the error.
    pub message: String,
    /// Machine-readable error code.
    pub code: String,
    /// Context snapshot at the time of failure.
    pub context: serde_json::Value,
    /// When the error was caught.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorReport {
    /// Creates a report stamped with the current time.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        code: impl Into<String>,
        context: serde_json::Value,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            context,
            occurred_at: Utc::now(),
        }
    }
}

/// Receives unexpected errors caught by the error boundary.
pub trait ErrorReporter: Send + Sync + 'static {
    /// Reports one error. Must not panic.
    fn report(&self, report: &ErrorReport);
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Arc<R> {
    fn report(&self, report: &ErrorReport) {
        (**self).report(report);
    }
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Box<R> {
    fn report(&self, report: &ErrorReport) {
        (**self).report(report);
    }
}

/// Writes reports to the log at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, report: &ErrorReport) {
        tracing::error!(
            code = %report.code,
            context = %report.context,
            occurred_at = %report.occurred_at,
            "{}",
            report.message
        );
    }
}

/// Discards reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _report: &ErrorReport) {}
}

/// Reporter backed by a closure.
///
/// # Example
///
/// ```
/// use hermes_telemetry::{ErrorReport, ErrorReporter, FnReporter};
///
/// let reporter = FnReporter::new(|report: &ErrorReport| eprintln!("{}", report.message));
/// reporter.report(&ErrorReport::new("boom", "internal_error", serde_json::Value::Null));
/// ```
pub struct FnReporter<F> {
    func: F,
}

impl<F> FnReporter<F> {
    /// Wraps a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> std::fmt::Debug for FnReporter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnReporter").finish_non_exhaustive()
    }
}

impl<F> ErrorReporter for FnReporter<F>
where
    F: Fn(&ErrorReport) + Send + Sync + 'static,
{
    fn report(&self, report: &ErrorReport) {
        (self.func)(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_fn_reporter_receives_report() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = FnReporter::new(move |report: &ErrorReport| {
            sink.lock().push(report.code.clone());
        });

        reporter.report(&ErrorReport::new(
            "boom",
            "internal_error",
            serde_json::json!({ "name": "fetch-apps" }),
        ));

        assert_eq!(seen.lock().as_slice(), ["internal_error"]);
    }

    #[test]
    fn test_reporters_behind_arc() {
        let reporter: Arc<dyn ErrorReporter> = Arc::new(NoopReporter);
        reporter.report(&ErrorReport::new("x", "y", serde_json::Value::Null));

        let boxed: Box<dyn ErrorReporter> = Box::new(LogReporter);
        boxed.report(&ErrorReport::new("x", "y", serde_json::Value::Null));
    }

    #[test]
    fn test_report_serializes() {
        let report = ErrorReport::new("boom", "internal_error", serde_json::json!({ "a": 1 }));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["message"], "boom");
        assert_eq!(value["context"]["a"], 1);
    }
}

//! Recording error reporter.

use hermes_telemetry::{ErrorReport, ErrorReporter};
use parking_lot::Mutex;
use std::sync::Arc;

/// An [`ErrorReporter`] that keeps every report. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<ErrorReport>>>,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every report received so far.
    #[must_use]
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().clone()
    }

    /// Returns the number of reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, report: &ErrorReport) {
        self.reports.lock().push(report.clone());
    }
}

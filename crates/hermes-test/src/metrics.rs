//! Capturing metrics recorder.

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

/// One metric registration: its name and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMetric {
    /// Metric name.
    pub name: String,
    /// Label pairs in registration order.
    pub labels: Vec<(String, String)>,
}

impl CapturedMetric {
    /// Returns the value of label `key`.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// A recorder installed for the current thread only, keeping every metric
/// registered while it is active.
///
/// ```
/// use hermes_test::MetricsCapture;
///
/// let capture = MetricsCapture::new();
/// capture.in_scope(|| metrics::counter!("demo_total", "endpoint" => "GET /apps").increment(1));
/// assert_eq!(capture.named("demo_total")[0].label("endpoint"), Some("GET /apps"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsCapture {
    captured: Arc<Mutex<Vec<CapturedMetric>>>,
}

impl MetricsCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with this capture as the thread's recorder.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(self, f)
    }

    /// Drives `future` to completion on a current-thread runtime with this
    /// capture as the recorder.
    ///
    /// # Panics
    ///
    /// Panics if the runtime cannot be built.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("current-thread runtime");
        self.in_scope(|| runtime.block_on(future))
    }

    /// Returns every registration so far.
    #[must_use]
    pub fn metrics(&self) -> Vec<CapturedMetric> {
        self.captured.lock().clone()
    }

    /// Returns the registrations of metric `name`.
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<CapturedMetric> {
        self.captured
            .lock()
            .iter()
            .filter(|metric| metric.name == name)
            .cloned()
            .collect()
    }

    fn capture(&self, key: &Key) {
        self.captured.lock().push(CapturedMetric {
            name: key.name().to_string(),
            labels: key
                .labels()
                .map(|label| (label.key().to_string(), label.value().to_string()))
                .collect(),
        });
    }
}

impl Recorder for MetricsCapture {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.capture(key);
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.capture(key);
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.capture(key);
        Histogram::noop()
    }
}

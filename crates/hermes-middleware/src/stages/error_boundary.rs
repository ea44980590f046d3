//! Error boundary middleware.
//!
//! Catches every exception raised further in. Errors whose message matches
//! a benign pattern (network failure during teardown, abort, store reset)
//! are dropped at debug level. Anything else is logged at error level and
//! handed to the [`ErrorReporter`] exactly once, with a JSON snapshot of the
//! context. The boundary never re-raises, so callers only ever see
//! [`ApiCtx::json`].

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, BoxFuture, HermesResult};
use hermes_telemetry::metrics::record_error_reported;
use hermes_telemetry::{ErrorReport, ErrorReporter};
use std::sync::Arc;

/// Swallows benign errors and reports the rest.
#[derive(Clone)]
pub struct ErrorBoundaryMiddleware {
    reporter: Arc<dyn ErrorReporter>,
}

impl ErrorBoundaryMiddleware {
    /// Creates a boundary reporting to `reporter`.
    #[must_use]
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { reporter }
    }
}

impl std::fmt::Debug for ErrorBoundaryMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBoundaryMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for ErrorBoundaryMiddleware {
    fn name(&self) -> &'static str {
        "error_boundary"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            let Err(error) = next.run(ctx).await else {
                return Ok(());
            };

            if error.is_benign() {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    endpoint = %ctx.name(),
                    error = %error,
                    "ignoring benign error"
                );
                return Ok(());
            }

            tracing::error!(
                request_id = %ctx.request_id(),
                endpoint = %ctx.name(),
                code = error.code(),
                error = %error,
                "api call failed"
            );
            record_error_reported(error.code());
            self.reporter
                .report(&ErrorReport::new(error.to_string(), error.code(), ctx.snapshot()));

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use hermes_core::HermesError;
    use hermes_test::RecordingReporter;

    async fn run_with(error: HermesError, reporter: &RecordingReporter) -> HermesResult<()> {
        let boundary = ErrorBoundaryMiddleware::new(Arc::new(reporter.clone()));
        let error = parking_lot::Mutex::new(Some(error));
        let fail = FnMiddleware::new("fail", move |_ctx, _next| {
            let error = error.lock().take();
            Box::pin(async move {
                match error {
                    Some(error) => Err(error),
                    None => Ok(()),
                }
            })
        });

        let mut ctx = ApiCtx::new("fetch-app", serde_json::json!({ "id": "1" }));
        boundary
            .process(&mut ctx, Next::new(&fail, Next::end()))
            .await
    }

    #[tokio::test]
    async fn test_abort_is_never_reported() {
        let reporter = RecordingReporter::new();
        assert!(run_with(HermesError::Aborted, &reporter).await.is_ok());
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_benign_transport_messages_are_swallowed() {
        let reporter = RecordingReporter::new();
        for message in ["Failed to fetch", "Load failed", "store reset"] {
            run_with(HermesError::transport(message), &reporter)
                .await
                .unwrap();
        }
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_error_reported_once_with_snapshot() {
        let reporter = RecordingReporter::new();
        let result = run_with(HermesError::internal("reducer exploded"), &reporter).await;

        assert!(result.is_ok());
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].code, "INTERNAL_ERROR");
        assert_eq!(reports[0].context["name"], "fetch-app");
        assert_eq!(reports[0].context["payload"]["id"], "1");
    }
}

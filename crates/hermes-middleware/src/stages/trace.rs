//! Call tracing middleware.
//!
//! Outermost stage: logs the invocation and its completion at debug level
//! and records `hermes_requests_total` and
//! `hermes_request_duration_seconds` for every call.

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, BoxFuture, HermesResult};
use hermes_telemetry::metrics::{record_call, CallOutcome};

/// Debug logging and call metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMiddleware {
    service: &'static str,
}

impl TraceMiddleware {
    /// Creates the stage for the named service.
    #[must_use]
    pub const fn new(service: &'static str) -> Self {
        Self { service }
    }
}

/// Classifies a finished call.
#[must_use]
pub fn outcome_of(ctx: &ApiCtx) -> CallOutcome {
    if ctx.aborted() {
        return CallOutcome::Aborted;
    }
    match ctx.json() {
        Some(Ok(_)) => CallOutcome::Ok,
        Some(Err(_)) => CallOutcome::Failure,
        None => CallOutcome::Empty,
    }
}

impl Middleware for TraceMiddleware {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            tracing::debug!(
                service = self.service,
                request_id = %ctx.request_id(),
                endpoint = %ctx.name(),
                key = %ctx.key(),
                "call started"
            );

            let result = next.run(ctx).await;

            let outcome = outcome_of(ctx);
            let elapsed = ctx.elapsed();
            record_call(ctx.name(), outcome, elapsed);

            tracing::debug!(
                service = self.service,
                request_id = %ctx.request_id(),
                endpoint = %ctx.name(),
                status = ctx.response().map(|r| r.status.as_u16()),
                outcome = outcome.as_str(),
                duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "call finished"
            );

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::ApiFailure;
    use serde_json::json;

    #[test]
    fn test_outcome_classification() {
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        assert_eq!(outcome_of(&ctx), CallOutcome::Empty);

        ctx.set_json(Ok(json!({})));
        assert_eq!(outcome_of(&ctx), CallOutcome::Ok);

        ctx.set_json(Err(ApiFailure::new("no")));
        assert_eq!(outcome_of(&ctx), CallOutcome::Failure);

        ctx.mark_aborted();
        assert_eq!(outcome_of(&ctx), CallOutcome::Aborted);
    }

    #[tokio::test]
    async fn test_passes_result_through() {
        let stage = TraceMiddleware::new("api");
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        assert!(stage.process(&mut ctx, Next::end()).await.is_ok());
    }
}

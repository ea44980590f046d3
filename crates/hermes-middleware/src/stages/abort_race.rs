//! Abort race middleware.
//!
//! Races the rest of the chain against the store-held [`AbortSignal`]. If
//! the signal fires first the chain future is dropped at its current
//! suspension point: nothing further in completes, side effects that
//! already happened stay, `ctx.json` stays `None` and the call is marked
//! aborted. The race resolves as `Ok`, so the boundary has nothing to report.
//!
//! A call created before the latest store reset is aborted up front.
//!
//! [`AbortSignal`]: hermes_core::AbortSignal

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, BoxFuture, HermesResult, Store};

/// Races the chain against the store abort signal.
#[derive(Debug, Clone)]
pub struct AbortRaceMiddleware {
    store: Store,
}

impl AbortRaceMiddleware {
    /// Creates the stage reading the signal from `store`.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Middleware for AbortRaceMiddleware {
    fn name(&self) -> &'static str {
        "abort_race"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            let signal = self.store.abort_signal();
            let stale = ctx.generation() != self.store.generation();

            let finished = if stale {
                None
            } else {
                tokio::select! {
                    biased;
                    () = signal.aborted() => None,
                    result = next.run(ctx) => Some(result),
                }
            };

            match finished {
                Some(result) => result,
                None => {
                    ctx.mark_aborted();
                    ctx.clear_json();
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        endpoint = %ctx.name(),
                        stale,
                        "call aborted"
                    );
                    Ok(())
                }
            }
        })
    }
}

//! Loader bookkeeping middleware.
//!
//! Marks the loader keyed by [`ApiCtx::key`] as loading before the call and
//! settles it afterwards from the outcome:
//!
//! | Outcome | Action |
//! |---------|--------|
//! | `Some(Ok(_))` | `LoaderSuccess` |
//! | `Some(Err(failure))` | `LoaderError` with the failure message |
//! | `None` (aborted) | `LoaderReset` |
//! | exception | `LoaderError` with the error text, then re-raised |

use crate::middleware::{Middleware, Next};
use hermes_core::{Action, ApiCtx, BoxFuture, HermesResult, Store};

/// Loader start/success/error bookkeeping.
#[derive(Debug, Clone)]
pub struct LoaderMiddleware {
    store: Store,
}

impl LoaderMiddleware {
    /// Creates the stage writing to `store`.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn meta_for(ctx: &ApiCtx) -> serde_json::Value {
    match ctx.response() {
        Some(response) => serde_json::json!({ "status": response.status.as_u16() }),
        None => serde_json::Value::Null,
    }
}

impl Middleware for LoaderMiddleware {
    fn name(&self) -> &'static str {
        "loader"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            let id = ctx.key().to_string();
            self.store.dispatch(Action::LoaderStart { id: id.clone() });

            if let Err(error) = next.run(ctx).await {
                self.store.dispatch(Action::LoaderError {
                    id,
                    message: error.to_string(),
                    meta: meta_for(ctx),
                });
                return Err(error);
            }

            let action = match ctx.json() {
                Some(Ok(_)) => Action::LoaderSuccess {
                    id,
                    meta: meta_for(ctx),
                },
                Some(Err(failure)) => Action::LoaderError {
                    id,
                    message: failure.message.clone(),
                    meta: meta_for(ctx),
                },
                None => Action::LoaderReset { id },
            };
            self.store.dispatch(action);
            Ok(())
        })
    }
}

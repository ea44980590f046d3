//! Clears a stale outcome before the call runs.

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, BoxFuture, HermesResult};

/// Sets `ctx.json` to `None`, then continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetJsonMiddleware;

impl Middleware for ResetJsonMiddleware {
    fn name(&self) -> &'static str {
        "reset_json"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        ctx.clear_json();
        Box::pin(next.run(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clears_previous_outcome() {
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        ctx.set_json(Ok(serde_json::json!("stale")));

        ResetJsonMiddleware
            .process(&mut ctx, Next::end())
            .await
            .unwrap();

        assert!(ctx.json().is_none());
    }
}

//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every pipeline stage
//! implements. A stage receives the call context and a [`Next`]
//! continuation; it may do work before calling `next`, after it, or both,
//! and it short-circuits the chain by not calling it at all.
//!
//! # Example
//!
//! ```
//! use hermes_core::{ApiCtx, BoxFuture, HermesResult};
//! use hermes_middleware::{Middleware, Next};
//!
//! struct Announce;
//!
//! impl Middleware for Announce {
//!     fn name(&self) -> &'static str {
//!         "announce"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut ApiCtx,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, HermesResult<()>> {
//!         Box::pin(async move {
//!             tracing::debug!(endpoint = %ctx.name(), "calling");
//!             next.run(ctx).await?;
//!             tracing::debug!(ok = ctx.is_ok(), "called");
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use hermes_core::{ApiCtx, BoxFuture, HermesResult};

/// The core middleware trait.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once; `Next` is consumed by value.
/// - Not calling it short-circuits everything further in.
/// - Domain failures travel in [`ApiCtx::json`]; `Err` is for exceptions.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the call.
    fn process<'a>(&'a self, ctx: &'a mut ApiCtx, next: Next<'a>)
        -> BoxFuture<'a, HermesResult<()>>;
}

/// Continuation to the rest of the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// Nothing left; completes immediately.
    End,
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given middleware.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal `Next`.
    #[must_use]
    pub const fn end() -> Self {
        Self {
            inner: NextInner::End,
        }
    }

    /// Returns true if nothing follows.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        matches!(self.inner, NextInner::End)
    }

    /// Invokes the rest of the chain.
    ///
    /// This consumes `self` so it can only be called once.
    pub async fn run(self, ctx: &mut ApiCtx) -> HermesResult<()> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, *next).await,
            NextInner::End => Ok(()),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_tuple("Next").field(&middleware.name()).finish()
            }
            NextInner::End => f.write_str("Next(end)"),
        }
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use hermes_middleware::FnMiddleware;
///
/// let tag = FnMiddleware::new("tag", |ctx, next| {
///     Box::pin(async move {
///         ctx.set_no_token(true);
///         next.run(ctx).await
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut ApiCtx, Next<'a>) -> BoxFuture<'a, HermesResult<()>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new closure-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut ApiCtx, Next<'a>) -> BoxFuture<'a, HermesResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        (self.func)(ctx, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Visit {
        name: &'static str,
    }

    impl Middleware for Visit {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut ApiCtx,
            next: Next<'a>,
        ) -> BoxFuture<'a, HermesResult<()>> {
            Box::pin(async move {
                let mut seen: Vec<String> = ctx.remove_extension().unwrap_or_default();
                seen.push(format!("in:{}", self.name));
                ctx.set_extension(seen);

                next.run(ctx).await?;

                let mut seen: Vec<String> = ctx.remove_extension().unwrap_or_default();
                seen.push(format!("out:{}", self.name));
                ctx.set_extension(seen);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_end_completes() {
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        let next = Next::end();
        assert!(next.is_end());
        assert!(next.run(&mut ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_chain_is_an_onion() {
        let first = Visit { name: "first" };
        let second = Visit { name: "second" };
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);

        let next = Next::new(&first, Next::new(&second, Next::end()));
        next.run(&mut ctx).await.unwrap();

        let seen = ctx.get_extension::<Vec<String>>().unwrap();
        assert_eq!(seen, &["in:first", "in:second", "out:second", "out:first"]);
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuits() {
        let stop = FnMiddleware::new("stop", |ctx, _next| {
            Box::pin(async move {
                ctx.set_json(Ok(json!("cached")));
                Ok(())
            })
        });
        let never = Visit { name: "never" };
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);

        Next::new(&stop, Next::new(&never, Next::end()))
            .run(&mut ctx)
            .await
            .unwrap();

        assert!(ctx.get_extension::<Vec<String>>().is_none());
        assert_eq!(ctx.json(), Some(&Ok(json!("cached"))));
    }
}

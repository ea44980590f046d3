//! Endpoint dispatch.
//!
//! Each API client registers its endpoints here by name. A call whose
//! [`ApiCtx::name`] matches an endpoint runs that endpoint's middleware,
//! which finishes the request and continues the chain; unknown names pass
//! straight through.

use crate::middleware::{Middleware, Next};
use crate::pipeline::BoxedMiddleware;
use hermes_core::{ApiCtx, BoxFuture, HermesResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatches to the endpoint registered under the call name.
#[derive(Default, Clone)]
pub struct RouterMiddleware {
    routes: HashMap<String, BoxedMiddleware>,
}

impl RouterMiddleware {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. A later registration under the same name wins.
    #[must_use]
    pub fn route<M: Middleware>(mut self, name: impl Into<String>, handler: M) -> Self {
        self.insert(name, Arc::new(handler));
        self
    }

    /// Registers a shared handler.
    pub fn insert(&mut self, name: impl Into<String>, handler: BoxedMiddleware) {
        let name = name.into();
        if self.routes.insert(name.clone(), handler).is_some() {
            tracing::warn!(endpoint = %name, "endpoint registered twice");
        }
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for RouterMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterMiddleware")
            .field("routes", &self.names())
            .finish()
    }
}

impl Middleware for RouterMiddleware {
    fn name(&self) -> &'static str {
        "router"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        match self.routes.get(ctx.name()) {
            Some(handler) => handler.process(ctx, next),
            None => {
                tracing::trace!(endpoint = %ctx.name(), "no endpoint registered, passing through");
                Box::pin(next.run(ctx))
            }
        }
    }
}

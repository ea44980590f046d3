//! Bearer token attachment.
//!
//! [`BearerTokenMiddleware`] attaches the session access token to every
//! call not flagged `no_token`. The auth client additionally runs
//! [`ElevatedTokenMiddleware`], which replaces it with the elevated token
//! for calls flagged `elevated` (step-up operations such as changing a
//! password or managing SSH keys).

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, BoxFuture, HermesResult, Store};
use http::header::AUTHORIZATION;

fn attach(ctx: &mut ApiCtx, token: &str) {
    ctx.request_mut()
        .set_header(AUTHORIZATION, &format!("Bearer {token}"));
}

/// Attaches `Authorization: Bearer <access token>`.
#[derive(Debug, Clone)]
pub struct BearerTokenMiddleware {
    store: Store,
}

impl BearerTokenMiddleware {
    /// Creates the stage reading tokens from `store`.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Middleware for BearerTokenMiddleware {
    fn name(&self) -> &'static str {
        "bearer_token"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        if !ctx.no_token() {
            if let Some(token) = self.store.access_token() {
                attach(ctx, &token);
            }
        }
        Box::pin(next.run(ctx))
    }
}

/// Attaches the elevated token to calls flagged `elevated`.
#[derive(Debug, Clone)]
pub struct ElevatedTokenMiddleware {
    store: Store,
}

impl ElevatedTokenMiddleware {
    /// Creates the stage reading tokens from `store`.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Middleware for ElevatedTokenMiddleware {
    fn name(&self) -> &'static str {
        "elevated_token"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        if ctx.elevated() {
            match self.store.elevated_token() {
                Some(token) => attach(ctx, &token),
                None => tracing::debug!(
                    endpoint = %ctx.name(),
                    "elevated call without an elevated token"
                ),
            }
        }
        Box::pin(next.run(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Action, Token};

    fn store_with_tokens() -> Store {
        let store = Store::new();
        store.dispatch(Action::SetToken(Token::new("session")));
        store.dispatch(Action::SetElevatedToken(Token::new("step-up")));
        store
    }

    async fn authorization(ctx: &mut ApiCtx, store: &Store) -> Option<String> {
        let bearer = BearerTokenMiddleware::new(store.clone());
        let elevated = ElevatedTokenMiddleware::new(store.clone());
        bearer
            .process(ctx, Next::new(&elevated, Next::end()))
            .await
            .unwrap();
        ctx.request().header("authorization").map(str::to_string)
    }

    #[tokio::test]
    async fn test_attaches_access_token() {
        let store = store_with_tokens();
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        assert_eq!(authorization(&mut ctx, &store).await.as_deref(), Some("Bearer session"));
    }

    #[tokio::test]
    async fn test_no_token_skips() {
        let store = store_with_tokens();
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        ctx.set_no_token(true);
        assert!(authorization(&mut ctx, &store).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_token_attaches_nothing() {
        let store = Store::new();
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        assert!(authorization(&mut ctx, &store).await.is_none());
    }

    #[tokio::test]
    async fn test_elevated_replaces_access_token() {
        let store = store_with_tokens();
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        ctx.set_elevated(true);
        assert_eq!(authorization(&mut ctx, &store).await.as_deref(), Some("Bearer step-up"));
    }
}

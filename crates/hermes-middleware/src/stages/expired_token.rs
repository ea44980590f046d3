//! Expired-token detection.
//!
//! Runs after the rest of the chain. A GET answered with 401 means the
//! session token is no longer valid: the token is cleared so the next call
//! re-authenticates. The failed request is not retried.

use crate::middleware::{Middleware, Next};
use hermes_core::{Action, ApiCtx, BoxFuture, HermesResult, Store};
use http::{Method, StatusCode};

/// Clears the access token after a GET answered with 401.
#[derive(Debug, Clone)]
pub struct ExpiredTokenMiddleware {
    store: Store,
}

impl ExpiredTokenMiddleware {
    /// Creates the stage writing to `store`.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Middleware for ExpiredTokenMiddleware {
    fn name(&self) -> &'static str {
        "expired_token"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            let result = next.run(ctx).await;

            let unauthorized = ctx
                .response()
                .is_some_and(|response| response.status == StatusCode::UNAUTHORIZED);
            if ctx.request().method == Method::GET && unauthorized {
                tracing::info!(
                    request_id = %ctx.request_id(),
                    endpoint = %ctx.name(),
                    "token expired, clearing session"
                );
                self.store.dispatch(Action::ResetToken);
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use hermes_core::{FetchRequest, FetchResponse, Token};

    fn respond_with(status: StatusCode) -> impl Middleware {
        FnMiddleware::new("respond", move |ctx, _next| {
            Box::pin(async move {
                ctx.set_response(FetchResponse::new(status, ""));
                Ok(())
            })
        })
    }

    async fn run(method: Method, status: StatusCode) -> Store {
        let store = Store::new();
        store.dispatch(Action::SetToken(Token::new("abc")));

        let stage = ExpiredTokenMiddleware::new(store.clone());
        let inner = respond_with(status);
        let mut ctx = ApiCtx::new("x", serde_json::Value::Null)
            .with_request(FetchRequest::new(method, "/apps"));
        stage
            .process(&mut ctx, Next::new(&inner, Next::end()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_401_resets_token() {
        let store = run(Method::GET, StatusCode::UNAUTHORIZED).await;
        assert!(store.access_token().is_none());
    }

    #[tokio::test]
    async fn test_post_401_keeps_token() {
        let store = run(Method::POST, StatusCode::UNAUTHORIZED).await;
        assert_eq!(store.access_token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_get_403_keeps_token() {
        let store = run(Method::GET, StatusCode::FORBIDDEN).await;
        assert_eq!(store.access_token().as_deref(), Some("abc"));
    }
}

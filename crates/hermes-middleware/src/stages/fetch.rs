//! Terminal fetch stage.
//!
//! Fills `:param` path segments from the payload, sends the request through
//! the [`Transport`] and records the outcome: `Ok(body)` for a 2xx answer,
//! `Err(ApiFailure)` otherwise. Failing to complete the exchange is an
//! exception and propagates as `Err`.

use crate::middleware::{Middleware, Next};
use hermes_core::{
    ApiCtx, ApiFailure, BoxFuture, HermesError, HermesResult, Store, Transport,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Characters escaped in a substituted path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/:([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"))
}

/// Replaces `/:name` segments with payload values, percent-encoded so a
/// value can never add a segment, a query or a fragment.
///
/// # Errors
///
/// Returns [`HermesError::InvalidRequest`] naming the first parameter the
/// payload does not provide.
///
/// ```
/// use hermes_core::ApiCtx;
/// use hermes_middleware::stages::fill_params;
/// use serde_json::json;
///
/// let ctx = ApiCtx::new("x", json!({ "id": 42 }));
/// let url = fill_params("https://api.test/databases/:id/operations", &ctx).unwrap();
/// assert_eq!(url, "https://api.test/databases/42/operations");
/// ```
pub fn fill_params(template: &str, ctx: &ApiCtx) -> HermesResult<String> {
    let pattern = param_pattern();
    if let Some(missing) = pattern
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| ctx.param(name).is_none())
    {
        return Err(HermesError::invalid_request(format!(
            "missing path parameter '{missing}' for {}",
            ctx.name()
        )));
    }

    Ok(pattern
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let value = ctx.param(&caps[1]).unwrap_or_default();
            format!("/{}", utf8_percent_encode(&value, PATH_SEGMENT))
        })
        .into_owned())
}

/// Sends the request and records the outcome.
#[derive(Clone)]
pub struct FetchMiddleware {
    transport: Arc<dyn Transport>,
    store: Store,
}

impl FetchMiddleware {
    /// Creates the stage. The store is consulted to drop answers that
    /// arrive after a reset.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: Store) -> Self {
        Self { transport, store }
    }
}

impl std::fmt::Debug for FetchMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for FetchMiddleware {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        _next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            let url = fill_params(&ctx.request().url, ctx)?;
            ctx.request_mut().url = url;

            let response = self.transport.send(ctx.request().clone()).await?;

            if self.store.generation() != ctx.generation() {
                return Err(HermesError::StoreReset);
            }

            let success = response.status.is_success();
            let body = match response.decode() {
                Ok(body) => body,
                // error pages are often not JSON
                Err(_) if !success => serde_json::Value::Null,
                Err(error) => return Err(error),
            };

            tracing::trace!(
                request_id = %ctx.request_id(),
                status = response.status.as_u16(),
                "response received"
            );

            let json = if success {
                Ok(body)
            } else {
                Err(ApiFailure::from_response(response.status, body))
            };
            ctx.set_response(response);
            ctx.set_json(json);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Action, FetchRequest};
    use hermes_test::MockTransport;
    use http::StatusCode;
    use serde_json::json;

    fn ctx_for(url: &str, payload: serde_json::Value) -> ApiCtx {
        ApiCtx::new("x", payload).with_request(FetchRequest::get(url))
    }

    #[test]
    fn test_fill_params_missing() {
        let ctx = ApiCtx::new("fetch-app", json!({}));
        let err = fill_params("https://api.test/apps/:id", &ctx).unwrap_err();
        assert!(matches!(err, HermesError::InvalidRequest { .. }));
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_fill_params_ignores_ports_and_schemes() {
        let ctx = ApiCtx::new("x", json!({ "id": "7" }));
        assert_eq!(
            fill_params("http://localhost:4000/apps/:id", &ctx).unwrap(),
            "http://localhost:4000/apps/7"
        );
    }

    #[test]
    fn test_fill_params_encodes_reserved_characters() {
        let ctx = ApiCtx::new("x", json!({ "id": "a/b?c#d" }));
        assert_eq!(
            fill_params("https://api.test/apps/:id/operations", &ctx).unwrap(),
            "https://api.test/apps/a%2Fb%3Fc%23d/operations"
        );

        let ctx = ApiCtx::new("x", json!({ "id": "50% off" }));
        assert_eq!(
            fill_params("https://api.test/apps/:id", &ctx).unwrap(),
            "https://api.test/apps/50%25%20off"
        );
    }

    #[tokio::test]
    async fn test_success_sets_ok() {
        let transport = MockTransport::new();
        transport.on_json("GET", "/apps/7", StatusCode::OK, json!({ "id": 7 }));
        let stage = FetchMiddleware::new(Arc::new(transport.clone()), Store::new());

        let mut ctx = ctx_for("https://api.test/apps/:id", json!({ "id": 7 }));
        stage.process(&mut ctx, Next::end()).await.unwrap();

        assert_eq!(ctx.json(), Some(&Ok(json!({ "id": 7 }))));
        assert_eq!(transport.requests()[0].url, "https://api.test/apps/7");
    }

    #[tokio::test]
    async fn test_error_status_sets_failure() {
        let transport = MockTransport::new();
        transport.on_json(
            "GET",
            "/apps/7",
            StatusCode::NOT_FOUND,
            json!({ "message": "App not found" }),
        );
        let stage = FetchMiddleware::new(Arc::new(transport), Store::new());

        let mut ctx = ctx_for("https://api.test/apps/7", serde_json::Value::Null);
        stage.process(&mut ctx, Next::end()).await.unwrap();

        let failure = ctx.json().unwrap().as_ref().unwrap_err();
        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.message, "App not found");
    }

    #[tokio::test]
    async fn test_non_json_error_page() {
        let transport = MockTransport::new();
        transport.on_text("GET", "/apps", StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        let stage = FetchMiddleware::new(Arc::new(transport), Store::new());

        let mut ctx = ctx_for("https://api.test/apps", serde_json::Value::Null);
        stage.process(&mut ctx, Next::end()).await.unwrap();

        let failure = ctx.json().unwrap().as_ref().unwrap_err();
        assert_eq!(failure.message, "Bad Gateway");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = MockTransport::new();
        transport.fail("GET", "/apps", "Failed to fetch");
        let stage = FetchMiddleware::new(Arc::new(transport), Store::new());

        let mut ctx = ctx_for("https://api.test/apps", serde_json::Value::Null);
        let err = stage.process(&mut ctx, Next::end()).await.unwrap_err();
        assert!(err.is_benign());
        assert!(ctx.json().is_none());
    }

    #[tokio::test]
    async fn test_answer_after_reset_is_dropped() {
        let store = Store::new();
        let transport = MockTransport::new();
        transport.on_json("GET", "/apps", StatusCode::OK, json!([]));
        let stage = FetchMiddleware::new(Arc::new(transport), store.clone());

        let mut ctx = ctx_for("https://api.test/apps", serde_json::Value::Null)
            .with_generation(store.generation());
        store.dispatch(Action::ResetStore);

        let err = stage.process(&mut ctx, Next::end()).await.unwrap_err();
        assert!(matches!(err, HermesError::StoreReset));
        assert!(ctx.json().is_none());
    }
}

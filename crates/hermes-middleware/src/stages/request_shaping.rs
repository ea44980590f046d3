//! Service-specific request shaping.
//!
//! Resolves the request URL against the service base URL, sets the cookie
//! credential mode and the service content type. Each API client gets its
//! own instance; this is the only stage that differs between services apart
//! from the endpoints themselves.

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, BoxFuture, Credentials, HermesResult};
use http::header::CONTENT_TYPE;

/// Content type of HAL+JSON services.
pub const HAL_JSON: &str = "application/hal+json";
/// Content type of plain JSON services.
pub const JSON: &str = "application/json";

/// Joins a base URL and a path.
///
/// Absolute paths (starting with `http`) pass through unchanged.
///
/// ```
/// use hermes_middleware::stages::resolve_url;
///
/// assert_eq!(resolve_url("https://api.test", "/apps"), "https://api.test/apps");
/// assert_eq!(resolve_url("https://api.test/", "/apps"), "https://api.test/apps");
/// assert_eq!(resolve_url("https://api.test", "https://cdn.test/x"), "https://cdn.test/x");
/// ```
#[must_use]
pub fn resolve_url(base: &str, path: &str) -> String {
    if path.starts_with("http") {
        return path.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{path}", &base[..base.len() - 1]),
        _ => format!("{base}{path}"),
    }
}

/// Base URL, credentials and content type for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestShapingMiddleware {
    base_url: String,
    content_type: &'static str,
    credentials_override: bool,
}

impl RequestShapingMiddleware {
    /// Creates the stage for a service.
    #[must_use]
    pub fn new(base_url: impl Into<String>, content_type: &'static str) -> Self {
        Self {
            base_url: base_url.into(),
            content_type,
            credentials_override: false,
        }
    }

    /// Lets a credential mode already set on the request win over `include`.
    #[must_use]
    pub fn with_credentials_override(mut self) -> Self {
        self.credentials_override = true;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Middleware for RequestShapingMiddleware {
    fn name(&self) -> &'static str {
        "request_shaping"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        let request = ctx.request_mut();
        request.url = resolve_url(&self.base_url, &request.url);
        request.credentials = match request.credentials {
            Some(mode) if self.credentials_override => Some(mode),
            _ => Some(Credentials::Include),
        };
        request.set_header(CONTENT_TYPE, self.content_type);

        Box::pin(next.run(ctx))
    }
}

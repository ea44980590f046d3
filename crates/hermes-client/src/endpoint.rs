//! Named endpoints.
//!
//! An [`Endpoint`] describes one backend route: its name, method, path
//! template and request options. [`ApiClient`](crate::ApiClient) uses the
//! descriptor to build the initial request, and registers the endpoint with
//! the router stage, where it fills in the body and query and runs its
//! post-processor once the call has succeeded.

use std::sync::Arc;

use hermes_core::{ApiCtx, BoxFuture, Credentials, FetchRequest, HermesError, HermesResult, Store};
use hermes_middleware::{Middleware, Next};
use http::Method;
use serde_json::{Map, Value};

/// Store update run after a successful call with the response body.
pub type PostProcessor = Arc<dyn Fn(&Store, &Value) + Send + Sync>;

/// A named, parameterized backend route.
///
/// # Example
///
/// ```
/// use hermes_client::Endpoint;
/// use http::Method;
///
/// let endpoint = Endpoint::get("GET /databases/:id/operations", "/databases/:id/operations")
///     .paginated();
///
/// assert_eq!(endpoint.method(), &Method::GET);
/// assert_eq!(endpoint.path_params(), ["id"]);
/// ```
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    method: Method,
    path: String,
    no_token: bool,
    elevated: bool,
    body_from_payload: bool,
    query: Vec<String>,
    credentials: Option<Credentials>,
    post_process: Option<PostProcessor>,
    store: Option<Store>,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            no_token: false,
            elevated: false,
            body_from_payload: false,
            query: Vec::new(),
            credentials: None,
            post_process: None,
            store: None,
        }
    }

    /// Creates a GET endpoint.
    #[must_use]
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::GET, path)
    }

    /// Creates a POST endpoint sending the payload as body.
    #[must_use]
    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::POST, path).body_from_payload()
    }

    /// Creates a PUT endpoint sending the payload as body.
    #[must_use]
    pub fn put(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::PUT, path).body_from_payload()
    }

    /// Creates a PATCH endpoint sending the payload as body.
    #[must_use]
    pub fn patch(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::PATCH, path).body_from_payload()
    }

    /// Creates a DELETE endpoint.
    #[must_use]
    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::DELETE, path)
    }

    /// Never attach the session token.
    #[must_use]
    pub fn no_token(mut self) -> Self {
        self.no_token = true;
        self
    }

    /// Authenticate with the elevated token.
    #[must_use]
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Send the payload, minus path and query parameters, as JSON body.
    #[must_use]
    pub fn body_from_payload(mut self) -> Self {
        self.body_from_payload = true;
        self
    }

    /// Copy a payload field into the query string when present.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>) -> Self {
        self.query.push(name.into());
        self
    }

    /// Accept a `page` query parameter.
    #[must_use]
    pub fn paginated(self) -> Self {
        self.query_param("page")
    }

    /// Request a specific credentials mode. Only honored by services that
    /// allow overriding it.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Run `f` with the response body after a successful call.
    #[must_use]
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&Store, &Value) + Send + Sync + 'static,
    {
        self.post_process = Some(Arc::new(f));
        self
    }

    /// Binds the store the post-processor writes to.
    #[must_use]
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn endpoint_name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if the endpoint accepts a `page` parameter.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.query.iter().any(|name| name == "page")
    }

    /// Returns the `:param` names of the path template, in order.
    #[must_use]
    pub fn path_params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .collect()
    }

    /// Builds the initial request and flags for a call.
    pub fn prepare(&self, ctx: &mut ApiCtx) {
        let mut request = FetchRequest::new(self.method.clone(), self.path.clone());
        request.credentials = self.credentials;
        *ctx.request_mut() = request;
        ctx.set_no_token(self.no_token);
        ctx.set_elevated(self.elevated);
    }

    fn body(&self, payload: &Value) -> Value {
        let Value::Object(fields) = payload else {
            return payload.clone();
        };
        let skipped = self.path_params();
        let body: Map<String, Value> = fields
            .iter()
            .filter(|(key, _)| {
                !skipped.contains(&key.as_str()) && !self.query.iter().any(|q| q == *key)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Value::Object(body)
    }

    fn append_query(&self, ctx: &mut ApiCtx) -> HermesResult<()> {
        let pairs: Vec<(String, String)> = self
            .query
            .iter()
            .filter_map(|name| ctx.param(name).map(|value| (name.clone(), value)))
            .collect();
        if pairs.is_empty() {
            return Ok(());
        }

        let request = ctx.request_mut();
        let mut url = reqwest::Url::parse(&request.url).map_err(|e| {
            HermesError::invalid_request(format!("cannot add query to '{}': {e}", request.url))
        })?;
        url.query_pairs_mut().extend_pairs(pairs);
        request.url = url.into();
        Ok(())
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("no_token", &self.no_token)
            .field("elevated", &self.elevated)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Middleware for Endpoint {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            if self.body_from_payload && !ctx.payload().is_null() {
                let body = self.body(ctx.payload());
                ctx.request_mut().set_json_body(&body);
            }
            self.append_query(ctx)?;

            next.run(ctx).await?;

            if let (Some(post_process), Some(store), Some(Ok(body))) =
                (&self.post_process, &self.store, ctx.json())
            {
                post_process(store, body);
            }
            Ok(())
        })
    }
}

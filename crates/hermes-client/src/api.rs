//! API client assembly.
//!
//! Every service gets its own [`ApiClient`]: the same twelve-stage
//! pipeline, differing only in the request-shaping stage and its endpoints.
//! [`Clients`] holds all six, sharing one store, transport and reporter.

use std::collections::HashMap;
use std::sync::Arc;

use hermes_config::HermesConfig;
use hermes_core::{ApiCtx, ApiFailure, FetchRequest, HermesError, HermesResult, Store, Transport};
use hermes_middleware::stages::{
    AbortRaceMiddleware, BearerTokenMiddleware, ElevatedTokenMiddleware, ErrorBoundaryMiddleware,
    ExpiredTokenMiddleware, FetchMiddleware, HalParserMiddleware, LoaderMiddleware,
    ResetJsonMiddleware, RouterMiddleware, TraceMiddleware,
};
use hermes_middleware::{Pipeline, Stage};
use hermes_telemetry::{ErrorReporter, LogReporter};
use http::Method;
use serde_json::Value;

use crate::catalog;
use crate::endpoint::Endpoint;
use crate::pagination::{combine_pages, CombinedPages, DEFAULT_MAX_PAGES};
use crate::service::ServiceKind;
use crate::transport::HttpTransport;

/// One service's request pipeline and endpoints.
///
/// # Example
///
/// ```no_run
/// use hermes_client::{ApiClient, Endpoint, HttpTransport, ServiceKind};
/// use hermes_config::HttpConfig;
/// use std::sync::Arc;
///
/// # async fn demo() -> hermes_core::HermesResult<()> {
/// let client = ApiClient::builder(ServiceKind::Api)
///     .base_url("https://api.example.test")
///     .transport(Arc::new(HttpTransport::new(&HttpConfig::default())?))
///     .endpoint(Endpoint::get("GET /apps/:id", "/apps/:id"))
///     .build()?;
///
/// let ctx = client.call("GET /apps/:id", serde_json::json!({ "id": 42 })).await;
/// if let Some(Ok(app)) = ctx.json() {
///     println!("{}", app["handle"]);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    kind: ServiceKind,
    base_url: String,
    store: Store,
    endpoints: HashMap<String, Arc<Endpoint>>,
    pipeline: Pipeline,
    max_pages: u32,
}

impl ApiClient {
    /// Starts building a client for `kind`.
    #[must_use]
    pub fn builder(kind: ServiceKind) -> ApiClientBuilder {
        ApiClientBuilder::new(kind)
    }

    /// Returns the service.
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the shared store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the registered endpoint named `name`.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name).map(AsRef::as_ref)
    }

    /// Returns the page cap used by [`ApiClient::call_all_pages`].
    #[must_use]
    pub const fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Builds the context for a call without running it.
    ///
    /// A registered endpoint supplies the method, path and flags. An
    /// unregistered name of the form `METHOD /path` is used as is; any
    /// other name is fetched with GET.
    #[must_use]
    pub fn context(&self, name: &str, payload: Value) -> ApiCtx {
        let mut ctx = ApiCtx::new(name, payload).with_generation(self.store.generation());
        match self.endpoints.get(name) {
            Some(endpoint) => endpoint.prepare(&mut ctx),
            None => {
                let request = match split_route_name(name) {
                    Some((method, path)) => FetchRequest::new(method, path),
                    None => FetchRequest::get(name),
                };
                *ctx.request_mut() = request;
            }
        }
        ctx
    }

    /// Runs a prepared context through the pipeline.
    pub async fn execute(&self, ctx: ApiCtx) -> ApiCtx {
        self.pipeline.process(ctx).await
    }

    /// Calls the endpoint `name` with `payload`.
    pub async fn call(&self, name: &str, payload: Value) -> ApiCtx {
        self.execute(self.context(name, payload)).await
    }

    /// Fetches every page of a paginated endpoint, up to the client's cap.
    ///
    /// # Errors
    ///
    /// Returns the page-1 failure; later page failures are kept in the
    /// result.
    pub async fn call_all_pages(
        &self,
        name: &str,
        payload: Value,
    ) -> Result<CombinedPages, ApiFailure> {
        self.call_pages(name, payload, self.max_pages).await
    }

    /// Returns the loader id of a paginated run of `name`.
    ///
    /// ```
    /// use hermes_client::ApiClient;
    ///
    /// let key = ApiClient::all_pages_key("GET /apps", &serde_json::json!({}));
    /// assert_eq!(key, "GET /apps [all-pages]|{}");
    /// ```
    #[must_use]
    pub fn all_pages_key(name: &str, payload: &Value) -> String {
        ApiCtx::new(format!("{name} [all-pages]"), payload.clone())
            .key()
            .to_string()
    }

    /// Fetches pages of a paginated endpoint up to `max` pages.
    ///
    /// The loader is tracked under [`ApiClient::all_pages_key`], not under
    /// any single page.
    ///
    /// # Errors
    ///
    /// Returns the page-1 failure.
    pub async fn call_pages(
        &self,
        name: &str,
        payload: Value,
        max: u32,
    ) -> Result<CombinedPages, ApiFailure> {
        let params = match payload {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        let key = Self::all_pages_key(name, &Value::Object(params.clone()));

        combine_pages(&self.store, name, &key, max, move |page| {
            let mut params = params.clone();
            params.insert("page".to_string(), Value::from(page));
            self.call(name, Value::Object(params))
        })
        .await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut endpoints: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        f.debug_struct("ApiClient")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("endpoints", &endpoints)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Splits `"POST /apps"` into its method and path.
fn split_route_name(name: &str) -> Option<(Method, &str)> {
    let (method, path) = name.split_once(' ')?;
    if !path.starts_with('/') && !path.starts_with("http") {
        return None;
    }
    let method = Method::from_bytes(method.as_bytes()).ok()?;
    Some((method, path))
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    kind: ServiceKind,
    base_url: Option<String>,
    store: Option<Store>,
    transport: Option<Arc<dyn Transport>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    endpoints: Vec<Endpoint>,
    max_pages: u32,
}

impl ApiClientBuilder {
    /// Creates a builder for `kind`.
    #[must_use]
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            base_url: None,
            store: None,
            transport: None,
            reporter: None,
            endpoints: Vec::new(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the shared store. Defaults to a fresh one.
    #[must_use]
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the error reporter. Defaults to [`LogReporter`].
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Registers an endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Registers several endpoints.
    #[must_use]
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    /// Sets the page cap for paginated fetches.
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Assembles the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`HermesError::Config`] if the base URL or the transport is
    /// missing.
    pub fn build(self) -> HermesResult<ApiClient> {
        let kind = self.kind;
        let base_url = self
            .base_url
            .ok_or_else(|| HermesError::config(format!("no base URL for the {kind} client")))?;
        let transport = self
            .transport
            .ok_or_else(|| HermesError::config(format!("no transport for the {kind} client")))?;
        let store = self.store.unwrap_or_default();
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(LogReporter) as Arc<dyn ErrorReporter>);

        let mut router = RouterMiddleware::new();
        let mut endpoints = HashMap::with_capacity(self.endpoints.len());
        for endpoint in self.endpoints {
            let endpoint = Arc::new(endpoint.with_store(store.clone()));
            router.insert(endpoint.endpoint_name().to_string(), endpoint.clone());
            endpoints.insert(endpoint.endpoint_name().to_string(), endpoint);
        }

        let mut builder = Pipeline::builder()
            .add_stage(Stage::Trace, TraceMiddleware::new(kind.name()))
            .add_stage(Stage::ErrorBoundary, ErrorBoundaryMiddleware::new(reporter))
            .add_stage(Stage::ResetJson, ResetJsonMiddleware)
            .add_stage(Stage::Loader, LoaderMiddleware::new(store.clone()))
            .add_stage(Stage::ExpiredToken, ExpiredTokenMiddleware::new(store.clone()))
            .add_stage(Stage::AbortRace, AbortRaceMiddleware::new(store.clone()))
            .add_stage(Stage::RequestShaping, kind.request_shaping(base_url.clone()))
            .add_stage(Stage::HalParser, HalParserMiddleware::new(store.clone()))
            .add_stage(Stage::Router, router)
            .add_stage(Stage::BearerToken, BearerTokenMiddleware::new(store.clone()));
        if kind.uses_elevated_token() {
            builder = builder.add_stage(
                Stage::ElevatedToken,
                ElevatedTokenMiddleware::new(store.clone()),
            );
        }
        let pipeline = builder
            .add_stage(Stage::Fetch, FetchMiddleware::new(transport, store.clone()))
            .build();

        tracing::debug!(
            service = kind.name(),
            base_url = %base_url,
            endpoints = endpoints.len(),
            stages = pipeline.stage_count(),
            "api client assembled"
        );

        Ok(ApiClient {
            kind,
            base_url,
            store,
            endpoints,
            pipeline,
            max_pages: self.max_pages,
        })
    }
}

impl std::fmt::Debug for ApiClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("endpoints", &self.endpoints.len())
            .finish_non_exhaustive()
    }
}

/// The six service clients, sharing one store, transport and reporter.
#[derive(Debug)]
pub struct Clients {
    store: Store,
    auth: ApiClient,
    api: ApiClient,
    billing: ApiClient,
    metric_tunnel: ApiClient,
    portal: ApiClient,
    ai: ApiClient,
}

impl Clients {
    /// Builds every client with the standard endpoint catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HermesError::Config`] if a client cannot be assembled.
    pub fn new(
        config: &HermesConfig,
        store: Store,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> HermesResult<Self> {
        let build = |kind: ServiceKind| {
            ApiClient::builder(kind)
                .base_url(kind.base_url(&config.services))
                .store(store.clone())
                .transport(transport.clone())
                .reporter(reporter.clone())
                .endpoints(catalog::endpoints_for(kind))
                .max_pages(config.pagination.max_pages)
                .build()
        };

        Ok(Self {
            auth: build(ServiceKind::Auth)?,
            api: build(ServiceKind::Api)?,
            billing: build(ServiceKind::Billing)?,
            metric_tunnel: build(ServiceKind::MetricTunnel)?,
            portal: build(ServiceKind::Portal)?,
            ai: build(ServiceKind::Ai)?,
            store,
        })
    }

    /// Builds every client over HTTP, logging unexpected errors.
    ///
    /// # Errors
    ///
    /// Returns [`HermesError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &HermesConfig, store: Store) -> HermesResult<Self> {
        let transport = Arc::new(HttpTransport::new(&config.http)?);
        Self::new(config, store, transport, Arc::new(LogReporter))
    }

    /// Returns the shared store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the client for `kind`.
    #[must_use]
    pub const fn get(&self, kind: ServiceKind) -> &ApiClient {
        match kind {
            ServiceKind::Auth => &self.auth,
            ServiceKind::Api => &self.api,
            ServiceKind::Billing => &self.billing,
            ServiceKind::MetricTunnel => &self.metric_tunnel,
            ServiceKind::Portal => &self.portal,
            ServiceKind::Ai => &self.ai,
        }
    }

    /// Auth service client.
    #[must_use]
    pub const fn auth(&self) -> &ApiClient {
        &self.auth
    }

    /// Main API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Billing client.
    #[must_use]
    pub const fn billing(&self) -> &ApiClient {
        &self.billing
    }

    /// Metrics tunnel client.
    #[must_use]
    pub const fn metric_tunnel(&self) -> &ApiClient {
        &self.metric_tunnel
    }

    /// Portal client.
    #[must_use]
    pub const fn portal(&self) -> &ApiClient {
        &self.portal
    }

    /// AI assistant client.
    #[must_use]
    pub const fn ai(&self) -> &ApiClient {
        &self.ai
    }

    /// Aborts every in-flight call and clears the store.
    pub fn reset(&self) {
        self.store.dispatch(hermes_core::Action::ResetStore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_test::MockTransport;

    fn client(kind: ServiceKind) -> ApiClient {
        ApiClient::builder(kind)
            .base_url("https://svc.test")
            .transport(Arc::new(MockTransport::new()))
            .endpoint(Endpoint::get("fetch-app", "/apps/:id"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_split_route_name() {
        let (method, path) = split_route_name("POST /apps").unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(path, "/apps");
        assert!(split_route_name("fetch apps").is_none());
        assert!(split_route_name("fetch-apps").is_none());
    }

    #[test]
    fn test_context_from_endpoint() {
        let ctx = client(ServiceKind::Api).context("fetch-app", serde_json::json!({ "id": 1 }));
        assert_eq!(ctx.request().method, Method::GET);
        assert_eq!(ctx.request().url, "/apps/:id");
    }

    #[test]
    fn test_context_from_route_name() {
        let ctx = client(ServiceKind::Api).context("DELETE /apps/:id", Value::Null);
        assert_eq!(ctx.request().method, Method::DELETE);
        assert_eq!(ctx.request().url, "/apps/:id");

        let ctx = client(ServiceKind::Api).context("/stacks", Value::Null);
        assert_eq!(ctx.request().method, Method::GET);
        assert_eq!(ctx.request().url, "/stacks");
    }

    #[test]
    fn test_only_auth_has_elevated_stage() {
        for kind in ServiceKind::all() {
            let stages = client(kind).pipeline().stages();
            assert_eq!(stages.contains(&Stage::ElevatedToken), kind == ServiceKind::Auth);
            assert_eq!(stages.first(), Some(&Stage::Trace));
            assert_eq!(stages.last(), Some(&Stage::Fetch));
        }
    }

    #[test]
    fn test_missing_transport_is_a_config_error() {
        let err = ApiClient::builder(ServiceKind::Portal)
            .base_url("https://portal.test")
            .build()
            .unwrap_err();
        assert!(matches!(err, HermesError::Config { .. }));
        assert!(err.to_string().contains("portal"));
    }

    #[test]
    fn test_clients_share_the_store() {
        let store = Store::new();
        let clients = Clients::new(
            &HermesConfig::test(),
            store.clone(),
            Arc::new(MockTransport::new()),
            Arc::new(hermes_telemetry::NoopReporter),
        )
        .unwrap();

        for kind in ServiceKind::all() {
            assert_eq!(clients.get(kind).kind(), kind);
            assert_eq!(clients.get(kind).store().generation(), store.generation());
        }
        clients.reset();
        assert_eq!(clients.api().store().generation(), store.generation());
        assert_eq!(clients.api().max_pages(), 50);
    }
}

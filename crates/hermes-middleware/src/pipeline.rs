//! Fixed-order middleware pipeline.
//!
//! Every API client runs its calls through a [`Pipeline`] whose stage order
//! is fixed by [`Stage`]. Stages may be registered in any order; `build()`
//! sorts them, so a client can never place credential decoration after the
//! fetch or wrap the abort race inside it.
//!
//! ## Pipeline Stages
//!
//! 1. **Trace** - Debug logs and call metrics
//! 2. **Error Boundary** - Swallows benign errors, reports the rest once
//! 3. **Reset Json** - Clears a stale outcome
//! 4. **Loader** - Loader start/success/error bookkeeping
//! 5. **Expired Token** - GET + 401 clears the access token
//! 6. **Abort Race** - Races the rest of the chain against the store abort signal
//! 7. **Request Shaping** - Base URL, credentials, content type
//! 8. **HAL Parser** - Upserts HAL entities into the store
//! 9. **Router** - Endpoint-specific request building
//! 10. **Bearer Token** - `Authorization: Bearer`
//! 11. **Elevated Token** - Elevated bearer (auth client only)
//! 12. **Fetch** - Terminal network call

use crate::middleware::{Middleware, Next};
use hermes_core::{ApiCtx, HermesResult};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The fixed-order middleware pipeline.
///
/// # Example
///
/// ```
/// use hermes_core::ApiCtx;
/// use hermes_middleware::pipeline::{Pipeline, Stage};
/// use hermes_middleware::stages::ResetJsonMiddleware;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder()
///     .add_stage(Stage::ResetJson, ResetJsonMiddleware)
///     .build();
///
/// let ctx = pipeline.process(ApiCtx::new("fetch-apps", serde_json::Value::Null)).await;
/// assert!(ctx.json().is_none());
/// # });
/// ```
pub struct Pipeline {
    stages: Vec<(Stage, BoxedMiddleware)>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs a call through every stage and returns the finished context.
    ///
    /// An error that escapes the chain (only possible without an error
    /// boundary stage) is logged and dropped; the context is returned
    /// either way.
    pub async fn process(&self, mut ctx: ApiCtx) -> ApiCtx {
        if let Err(error) = self.run(&mut ctx).await {
            tracing::warn!(
                request_id = %ctx.request_id(),
                endpoint = %ctx.name(),
                error = %error,
                "error escaped the pipeline"
            );
        }
        ctx
    }

    /// Runs a call through every stage, returning any escaped error.
    pub async fn run(&self, ctx: &mut ApiCtx) -> HermesResult<()> {
        self.build_chain().run(ctx).await
    }

    /// Builds the chain from back to front.
    fn build_chain(&self) -> Next<'_> {
        let mut next = Next::end();
        for (_, middleware) in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(_, mw)| mw.name()).collect()
    }

    /// Returns the registered stages in order.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.iter().map(|(stage, _)| *stage).collect()
    }

    /// Returns the number of middleware.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<(Stage, BoxedMiddleware)>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Registers a middleware at a stage.
    ///
    /// Several middleware may share a stage; they keep registration order.
    #[must_use]
    pub fn add_stage<M: Middleware>(self, stage: Stage, middleware: M) -> Self {
        self.add_boxed(stage, Arc::new(middleware))
    }

    /// Registers an already shared middleware at a stage.
    #[must_use]
    pub fn add_boxed(mut self, stage: Stage, middleware: BoxedMiddleware) -> Self {
        self.stages.push((stage, middleware));
        self
    }

    /// Builds the pipeline, ordering middleware by stage.
    #[must_use]
    pub fn build(mut self) -> Pipeline {
        self.stages.sort_by_key(|(stage, _)| *stage);
        Pipeline {
            stages: self.stages,
        }
    }
}

/// Pipeline position of a middleware.
///
/// Lower values run first on the way in and last on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Debug logging and metrics
    Trace = 1,
    /// Stage 2: Error boundary
    ErrorBoundary = 2,
    /// Stage 3: Clear stale outcome
    ResetJson = 3,
    /// Stage 4: Loader bookkeeping
    Loader = 4,
    /// Stage 5: Expired-token detection
    ExpiredToken = 5,
    /// Stage 6: Abort race
    AbortRace = 6,
    /// Stage 7: Service-specific request shaping
    RequestShaping = 7,
    /// Stage 8: HAL entity extraction
    HalParser = 8,
    /// Stage 9: Endpoint dispatch
    Router = 9,
    /// Stage 10: Bearer token
    BearerToken = 10,
    /// Stage 11: Elevated token
    ElevatedToken = 11,
    /// Stage 12: Network call
    Fetch = 12,
}

impl Stage {
    /// Returns true for stages every client shares.
    #[must_use]
    pub const fn is_shared(self) -> bool {
        !matches!(
            self,
            Self::RequestShaping | Self::Router | Self::ElevatedToken
        )
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::ErrorBoundary => "error_boundary",
            Self::ResetJson => "reset_json",
            Self::Loader => "loader",
            Self::ExpiredToken => "expired_token",
            Self::AbortRace => "abort_race",
            Self::RequestShaping => "request_shaping",
            Self::HalParser => "hal_parser",
            Self::Router => "router",
            Self::BearerToken => "bearer_token",
            Self::ElevatedToken => "elevated_token",
            Self::Fetch => "fetch",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 12] {
        [
            Self::Trace,
            Self::ErrorBoundary,
            Self::ResetJson,
            Self::Loader,
            Self::ExpiredToken,
            Self::AbortRace,
            Self::RequestShaping,
            Self::HalParser,
            Self::Router,
            Self::BearerToken,
            Self::ElevatedToken,
            Self::Fetch,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use hermes_core::{BoxFuture, HermesError};
    use std::sync::Mutex;

    struct Record {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Record {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut ApiCtx,
            next: Next<'a>,
        ) -> BoxFuture<'a, HermesResult<()>> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.name);
                next.run(ctx).await
            })
        }
    }

    #[tokio::test]
    async fn test_registration_order_does_not_matter() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let record = |name| Record {
            name,
            order: order.clone(),
        };

        let pipeline = Pipeline::builder()
            .add_stage(Stage::BearerToken, record("bearer"))
            .add_stage(Stage::Trace, record("trace"))
            .add_stage(Stage::Router, record("router"))
            .add_stage(Stage::Router, record("router-2"))
            .add_stage(Stage::AbortRace, record("abort"))
            .build();

        pipeline
            .process(ApiCtx::new("x", serde_json::Value::Null))
            .await;

        assert_eq!(
            *order.lock().unwrap(),
            vec!["trace", "abort", "router", "router-2", "bearer"]
        );
        assert_eq!(
            pipeline.stages(),
            vec![
                Stage::Trace,
                Stage::AbortRace,
                Stage::Router,
                Stage::Router,
                Stage::BearerToken
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let ctx = pipeline
            .process(ApiCtx::new("x", serde_json::Value::Null))
            .await;
        assert!(ctx.json().is_none());
    }

    #[tokio::test]
    async fn test_escaped_error_is_returned_by_run() {
        let pipeline = Pipeline::builder()
            .add_stage(
                Stage::Fetch,
                FnMiddleware::new("boom", |_ctx, _next| {
                    Box::pin(async { Err(HermesError::internal("boom")) })
                }),
            )
            .build();

        let mut ctx = ApiCtx::new("x", serde_json::Value::Null);
        assert!(pipeline.run(&mut ctx).await.is_err());

        // process swallows it
        let ctx = pipeline
            .process(ApiCtx::new("x", serde_json::Value::Null))
            .await;
        assert!(ctx.json().is_none());
    }

    #[test]
    fn test_stage_ordering() {
        let all = Stage::all();
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(Stage::AbortRace < Stage::Fetch);
        assert!(Stage::Router < Stage::BearerToken);
        assert!(Stage::BearerToken < Stage::ElevatedToken);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Trace.name(), "trace");
        assert_eq!(Stage::ErrorBoundary.name(), "error_boundary");
        assert_eq!(Stage::HalParser.name(), "hal_parser");
        assert_eq!(Stage::Fetch.name(), "fetch");
    }

    #[test]
    fn test_shared_stages() {
        assert!(Stage::Trace.is_shared());
        assert!(Stage::Fetch.is_shared());
        assert!(!Stage::RequestShaping.is_shared());
        assert!(!Stage::ElevatedToken.is_shared());
    }
}

//! Request synthesis pipeline.
//!
//! A [`Pipeline`] is an immutable list of [`Stage`]s executed in order through
//! a [`Next`] cursor. The built-in stages run in a fixed order, caller stages
//! are appended after them, and the finalize stage always runs last:
//!
//! ```text
//! method -> unattributed -> body -> header -> query -> route
//!        -> added/transformed -> custom -> caller stages... -> finalize
//! ```
//!
//! A built pipeline holds no per-call state and can be shared across
//! concurrent calls.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tether_core::{
//!     BindingSource, CallId, CallerParameter, CustomParameters, EndpointDescriptor,
//!     EndpointParameter, Method, Pipeline, TypeRef,
//! };
//!
//! # tokio_test_block_on(async {
//! let endpoint = EndpointDescriptor::builder("Users.Get", Method::Get, "/users/{id}")
//!     .parameter(EndpointParameter::new("id", TypeRef::integer()).bound_to(BindingSource::Route))
//!     .build()?;
//!
//! let pipeline = Pipeline::builder().build();
//! let request = pipeline
//!     .synthesize(
//!         Arc::new(endpoint),
//!         vec![CallerParameter::new("id", TypeRef::integer(), json!(5))],
//!         CustomParameters::new(),
//!         CallId::new(),
//!     )
//!     .await?;
//!
//! assert_eq!(request.url().path(), "/users/5");
//! # Ok::<(), tether_core::Error>(())
//! # }).expect("synthesize");
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(f)
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderName;
use tracing::{Instrument, debug_span};

use crate::call_id::CALL_ID_HEADER;
use crate::stages::{
    AddedOrTransformedStage, CustomParameterStage, FinalizeStage, FromBodyStage,
    FromHeaderStage, FromQueryStage, FromRouteStage, MethodStage, UnattributedStage,
};
use crate::{
    BodySerializer, CallId, CallerParameter, CustomParameters, DEFAULT_MAX_DEPTH,
    EndpointDescriptor, Error, JsonBodySerializer, Request, RequestBuildContext, Result,
    RouteSynthesizer, TemplateRouteSynthesizer, link,
};

/// Future returned by a stage.
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<Request<Bytes>>> + Send + 'a>>;

/// One step of request synthesis.
///
/// The default implementation delegates to the next stage; only the finalize
/// stage produces the request itself.
///
/// # Example
///
/// A stage adding a header when a marker custom parameter is present:
///
/// ```
/// use tether_core::{Next, RequestBuildContext, Stage, StageFuture};
///
/// #[derive(Clone)]
/// struct Authenticated;
///
/// struct AuthStage;
///
/// impl Stage for AuthStage {
///     fn create_request<'a>(
///         &'a self,
///         ctx: &'a mut RequestBuildContext,
///         next: Next<'a>,
///     ) -> StageFuture<'a> {
///         next.run_after(ctx, |ctx| {
///             if ctx.custom().contains::<Authenticated>() {
///                 ctx.set_header("authorization", "Bearer test")?;
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// Stage name, used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Contribute to the request, then hand over to `next`.
    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run(ctx)
    }
}

/// Cursor over the stages left to run.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
}

impl<'a> Next<'a> {
    /// Run the remaining stages.
    #[must_use]
    pub fn run(self, ctx: &'a mut RequestBuildContext) -> StageFuture<'a> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                tracing::trace!(stage = stage.name(), "entering stage");
                stage.create_request(ctx, Next { stages: rest })
            }
            None => Box::pin(std::future::ready(Err(Error::invalid_request(
                "pipeline ended without producing a request",
            )))),
        }
    }

    /// Apply a synchronous binding step, then run the remaining stages.
    ///
    /// The remaining stages are skipped when `bind` fails.
    pub fn run_after<F>(self, ctx: &'a mut RequestBuildContext, bind: F) -> StageFuture<'a>
    where
        F: FnOnce(&mut RequestBuildContext) -> Result<()>,
    {
        match bind(ctx) {
            Ok(()) => self.run(ctx),
            Err(err) => Box::pin(std::future::ready(Err(err))),
        }
    }

    /// Number of stages left, including the finalize stage.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.stages.len())
            .finish()
    }
}

/// Immutable, shareable request synthesis pipeline.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Stage>]>,
    max_depth: usize,
}

impl Pipeline {
    /// Create a [`PipelineBuilder`].
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|stage| stage.name())
    }

    /// Nesting limit applied while flattening.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Link the caller arguments with the endpoint and run every stage.
    ///
    /// # Errors
    ///
    /// Returns the first synthesis error raised by a stage; no request is
    /// produced in that case.
    pub async fn synthesize(
        &self,
        endpoint: Arc<EndpointDescriptor>,
        caller: Vec<CallerParameter>,
        custom: CustomParameters,
        call_id: CallId,
    ) -> Result<Request<Bytes>> {
        let span = debug_span!("synthesize", endpoint = endpoint.id(), %call_id);
        let parameters = link(endpoint.parameters(), &caller);
        let mut ctx =
            RequestBuildContext::new(endpoint, parameters, custom, call_id, self.max_depth);
        self.run(&mut ctx).instrument(span).await
    }

    /// Run every stage on an existing context.
    pub fn run<'a>(&'a self, ctx: &'a mut RequestBuildContext) -> StageFuture<'a> {
        Next {
            stages: &self.stages,
        }
        .run(ctx)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names().collect::<Vec<_>>())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    base_url: Option<url::Url>,
    synthesizer: Arc<dyn RouteSynthesizer>,
    serializer: Arc<dyn BodySerializer>,
    correlation_header: HeaderName,
    max_depth: usize,
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    /// Create a builder targeting `http://localhost/` with the default
    /// synthesizer and serializer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: None,
            synthesizer: Arc::new(TemplateRouteSynthesizer),
            serializer: Arc::new(JsonBodySerializer),
            correlation_header: HeaderName::from_static(CALL_ID_HEADER),
            max_depth: DEFAULT_MAX_DEPTH,
            stages: Vec::new(),
        }
    }

    /// Base URL synthesized paths are appended to.
    #[must_use]
    pub fn base_url(mut self, base_url: url::Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Route synthesizer.
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: impl RouteSynthesizer + 'static) -> Self {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    /// Body serializer.
    #[must_use]
    pub fn serializer(mut self, serializer: impl BodySerializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Correlation header name (default `call-id`).
    #[must_use]
    pub fn correlation_header(mut self, name: HeaderName) -> Self {
        self.correlation_header = name;
        self
    }

    /// Nesting limit applied while flattening.
    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Append a caller stage; caller stages run in registration order,
    /// after the built-in stages and before finalize.
    #[must_use]
    pub fn add_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append a shared caller stage.
    #[must_use]
    pub fn add_shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Build the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let finalize = FinalizeStage::new(
            self.base_url,
            self.synthesizer,
            self.serializer,
            self.correlation_header,
        );

        let mut stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(MethodStage),
            Arc::new(UnattributedStage),
            Arc::new(FromBodyStage),
            Arc::new(FromHeaderStage),
            Arc::new(FromQueryStage),
            Arc::new(FromRouteStage),
            Arc::new(AddedOrTransformedStage),
            Arc::new(CustomParameterStage),
        ];
        stages.extend(self.stages);
        stages.push(Arc::new(finalize));

        Pipeline {
            stages: stages.into(),
            max_depth: self.max_depth,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("base_url", &self.base_url.as_ref().map(url::Url::as_str))
            .field("correlation_header", &self.correlation_header)
            .field("max_depth", &self.max_depth)
            .field("stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}

//! Typed test calls against a running server.
//!
//! A [`CallIntent`] names the target endpoint and carries the caller's
//! arguments plus any custom parameters. The [`TestClient`] looks the
//! endpoint up, runs the pipeline, sends the request and collects the server
//! failure recorded under the call id, if any.
//!
//! # Example
//!
//! ```ignore
//! use tether::prelude::*;
//!
//! let catalog = StaticEndpointCatalog::new().with(
//!     EndpointDescriptor::builder("Users.Get", Method::Get, "/users/{id}")
//!         .parameter(
//!             EndpointParameter::new("id", TypeRef::integer()).bound_to(BindingSource::Route),
//!         )
//!         .build()?,
//! );
//! let client = TestClient::builder(HyperClient::new(), catalog)
//!     .base_url(server_url)
//!     .build();
//!
//! let invocation = client
//!     .invoke(CallIntent::new("Users.Get").value("id", TypeRef::integer(), &5)?)
//!     .await?;
//! assert!(invocation.is_success());
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tether_core::{
    BodySerializer, CallId, CallerParameter, CustomParameters, EndpointCatalog, HttpClient,
    Pipeline, PipelineBuilder, RouteSynthesizer, Stage, TypeRef,
};
use tracing::{Instrument, debug, info_span, warn};

use crate::{ClientConfig, CorrelationStore, InMemoryCorrelationStore, RecordedFailure};
use crate::{HyperClient, Request, Response, Result};

// ============================================================================
// Call intent
// ============================================================================

/// Target endpoint, caller arguments, and custom parameters of one call.
#[derive(Debug, Clone)]
pub struct CallIntent {
    endpoint: String,
    arguments: Vec<CallerParameter>,
    custom: CustomParameters,
}

impl CallIntent {
    /// Start a call to an endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            arguments: Vec::new(),
            custom: CustomParameters::new(),
        }
    }

    /// Add a caller argument.
    #[must_use]
    pub fn arg(mut self, parameter: CallerParameter) -> Self {
        self.arguments.push(parameter);
        self
    }

    /// Add a caller argument from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn value<T: Serialize + ?Sized>(self, name: &str, ty: TypeRef, value: &T) -> Result<Self> {
        let parameter = CallerParameter::from_serialize(name, ty, value)?;
        Ok(self.arg(parameter))
    }

    /// Add a custom header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom = self.custom.with_header(name, value);
        self
    }

    /// Set a custom body, replacing any bound one.
    #[must_use]
    pub fn body(mut self, value: impl Into<Value>) -> Self {
        self.custom = self.custom.with_body(value);
        self
    }

    /// Add a custom route-or-query value.
    #[must_use]
    pub fn route_or_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom = self.custom.with_route_or_query(name, value);
        self
    }

    /// Add a named value for caller stages; never sent.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom = self.custom.with_named(name, value);
        self
    }

    /// Add a typed marker for caller stages; never sent.
    #[must_use]
    pub fn marker<T: Clone + Send + Sync + 'static>(mut self, marker: T) -> Self {
        self.custom = self.custom.with_marker(marker);
        self
    }

    /// Endpoint identifier.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Caller arguments, in call order.
    #[must_use]
    pub fn arguments(&self) -> &[CallerParameter] {
        &self.arguments
    }

    /// Custom parameters.
    #[must_use]
    pub const fn custom(&self) -> &CustomParameters {
        &self.custom
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// Outcome of a sent call.
#[derive(Debug, Clone)]
pub struct Invocation {
    call_id: CallId,
    response: Response<Bytes>,
    failure: Option<RecordedFailure>,
}

impl Invocation {
    /// Call id the request was sent with.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Server response.
    #[must_use]
    pub const fn response(&self) -> &Response<Bytes> {
        &self.response
    }

    /// Consume into the response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        self.response
    }

    /// Failure the server recorded for this call.
    #[must_use]
    pub const fn failure(&self) -> Option<&RecordedFailure> {
        self.failure.as_ref()
    }

    /// 2xx response and no recorded failure.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.response.is_success() && self.failure.is_none()
    }

    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        self.response.json()
    }
}

// ============================================================================
// Test client
// ============================================================================

/// Synthesizes and sends calls to a server's endpoints.
pub struct TestClient<C = HyperClient> {
    client: C,
    pipeline: Arc<Pipeline>,
    catalog: Arc<dyn EndpointCatalog>,
    correlation: Arc<dyn CorrelationStore>,
}

impl TestClient<HyperClient> {
    /// Create a client over hyper from a configuration.
    #[must_use]
    pub fn with_config(
        base_url: url::Url,
        catalog: impl EndpointCatalog + 'static,
        config: &ClientConfig,
    ) -> Self {
        let client = HyperClient::builder().config(config).build();
        TestClient::builder(client, catalog)
            .base_url(base_url)
            .config(config)
            .build()
    }
}

impl<C: HttpClient> TestClient<C> {
    /// Create a [`TestClientBuilder`] over a transport.
    #[must_use]
    pub fn builder(client: C, catalog: impl EndpointCatalog + 'static) -> TestClientBuilder<C> {
        TestClientBuilder {
            client,
            catalog: Arc::new(catalog),
            correlation: Arc::new(InMemoryCorrelationStore::new()),
            pipeline: PipelineBuilder::new(),
        }
    }

    /// The transport.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The request pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The correlation store, shared with the server side.
    #[must_use]
    pub fn correlation_store(&self) -> Arc<dyn CorrelationStore> {
        Arc::clone(&self.correlation)
    }

    /// Build the request of a call without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEndpoint`](crate::Error::UnknownEndpoint) or a
    /// synthesis error.
    pub async fn synthesize(&self, call: CallIntent) -> Result<Request<Bytes>> {
        self.synthesize_with_id(call, CallId::new()).await
    }

    async fn synthesize_with_id(
        &self,
        call: CallIntent,
        call_id: CallId,
    ) -> Result<Request<Bytes>> {
        let endpoint = self.catalog.resolve(&call.endpoint)?;
        self.pipeline
            .synthesize(endpoint, call.arguments, call.custom, call_id)
            .await
    }

    /// Synthesize and send a call.
    ///
    /// The call id is registered in the correlation store only once the
    /// request is built, so a synthesis error leaves no trace there.
    ///
    /// # Errors
    ///
    /// Returns a synthesis error before anything is sent, or the transport
    /// error.
    pub async fn invoke(&self, call: CallIntent) -> Result<Invocation> {
        let call_id = CallId::new();
        let span = info_span!("invoke", endpoint = call.endpoint(), %call_id);

        async move {
            let request = self.synthesize_with_id(call, call_id).await?;

            self.correlation.begin(call_id);
            let result = self.client.execute(request).await;
            let failure = self.correlation.take(call_id);

            let response = result?;
            match &failure {
                Some(failure) => {
                    warn!(status = response.status(), %failure, "server recorded a failure");
                }
                None => debug!(status = response.status(), "call completed"),
            }
            Ok(Invocation {
                call_id,
                response,
                failure,
            })
        }
        .instrument(span)
        .await
    }
}

impl<C> std::fmt::Debug for TestClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TestClient`].
pub struct TestClientBuilder<C> {
    client: C,
    catalog: Arc<dyn EndpointCatalog>,
    correlation: Arc<dyn CorrelationStore>,
    pipeline: PipelineBuilder,
}

impl<C: HttpClient> TestClientBuilder<C> {
    /// Base URL of the server under test.
    #[must_use]
    pub fn base_url(mut self, base_url: url::Url) -> Self {
        self.pipeline = self.pipeline.base_url(base_url);
        self
    }

    /// Apply the pipeline settings of a configuration.
    #[must_use]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.pipeline = self
            .pipeline
            .correlation_header(config.correlation_header.clone())
            .max_depth(config.max_depth);
        self
    }

    /// Share a correlation store with the server side.
    #[must_use]
    pub fn correlation_store(mut self, store: Arc<dyn CorrelationStore>) -> Self {
        self.correlation = store;
        self
    }

    /// Route synthesizer.
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: impl RouteSynthesizer + 'static) -> Self {
        self.pipeline = self.pipeline.synthesizer(synthesizer);
        self
    }

    /// Body serializer.
    #[must_use]
    pub fn serializer(mut self, serializer: impl BodySerializer + 'static) -> Self {
        self.pipeline = self.pipeline.serializer(serializer);
        self
    }

    /// Append a caller stage, run after the built-in stages.
    #[must_use]
    pub fn add_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.pipeline = self.pipeline.add_stage(stage);
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> TestClient<C> {
        TestClient {
            client: self.client,
            pipeline: Arc::new(self.pipeline.build()),
            catalog: self.catalog,
            correlation: self.correlation,
        }
    }
}

impl<C> std::fmt::Debug for TestClientBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClientBuilder")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

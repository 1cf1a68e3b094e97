//! Synthesize HTTP requests for server endpoints from typed test calls.
//!
//! An endpoint is described once: its method, route template and the binding
//! source of every parameter. A test then calls it with plain values; the
//! request pipeline links those values to the endpoint parameters, binds them
//! to the route, query, headers or body, and sends the request over hyper.
//!
//! # Example
//!
//! ```ignore
//! use tether::prelude::*;
//!
//! let catalog = StaticEndpointCatalog::new().with(
//!     EndpointDescriptor::builder("Orders.Create", Method::Post, "/orders")
//!         .parameter(
//!             EndpointParameter::new("order", TypeRef::object("Order"))
//!                 .bound_to(BindingSource::Body),
//!         )
//!         .build()?,
//! );
//! let client = TestClient::with_config(server_url, catalog, &ClientConfig::default());
//!
//! let invocation = client
//!     .invoke(CallIntent::new("Orders.Create").value("order", TypeRef::object("Order"), &order)?)
//!     .await?;
//! assert!(invocation.is_success());
//! ```
//!
//! Pipeline stages and value binding live in [`tether_core`]; this crate adds
//! the hyper transport, Tower middleware, server failure correlation and the
//! [`TestClient`].

mod client;
mod config;
mod correlation;
pub mod middleware;
pub mod prelude;
mod test_client;

// Re-export client types
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use correlation::{CorrelationStore, InMemoryCorrelationStore, RecordedFailure};
pub use test_client::{CallIntent, Invocation, TestClient, TestClientBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use tether_core::{
    BindingSource, BodySerializer, CALL_ID_HEADER, CallId, CallerParameter, ContentType,
    CustomParameter, CustomParameters, EndpointCatalog, EndpointDescriptor,
    EndpointDescriptorBuilder, EndpointParameter, Error, HttpClient, JsonBodySerializer,
    LinkedParameter, Method, Next, ParameterMapping, Pipeline, PipelineBuilder, Request,
    RequestBuildContext, RequestBuilder, Response, Result, RouteSynthesizer, RouteTemplate,
    SimpleType, Stage, StageFuture, StaticEndpointCatalog, TemplateRouteSynthesizer, TypeRef,
    UrlValueOrigin, UrlValues, from_json, to_form, to_json,
};

// Re-export http types for status codes and headers
pub use tether_core::{StatusCode, header};

pub use url;

//! Core types and traits for tether, a request synthesis pipeline for
//! integration tests.
//!
//! Given an endpoint description and the values a test passes for it, tether
//! reconciles the two parameter lists and builds the HTTP request the
//! endpoint would accept:
//! - [`EndpointDescriptor`] and [`EndpointCatalog`] - what the server declares
//! - [`CallerParameter`] and [`CustomParameters`] - what the caller passes
//! - [`link`] and [`LinkedParameter`] - the reconciled view of both
//! - [`Pipeline`], [`Stage`] and [`Next`] - ordered request synthesis
//! - [`RouteSynthesizer`] and [`BodySerializer`] - pluggable URL and body encoding
//! - [`Request`], [`Response`] and [`HttpClient`] - the wire types and transport
//! - [`Error`] and [`Result`] - error handling
//! - [`CallId`] - per-call correlation id sent as the `call-id` header

mod body;
mod call_id;
mod client;
mod context;
mod custom;
mod endpoint;
mod error;
mod link;
mod method;
mod params;
mod pipeline;
pub mod prelude;
mod request;
mod response;
mod route;
pub mod stages;
pub mod value;

pub use body::{BodySerializer, ContentType, JsonBodySerializer, from_json, to_form, to_json};
pub use call_id::{CALL_ID_HEADER, CallId};
pub use client::HttpClient;
pub use context::{RequestBuildContext, UrlValueOrigin};
pub use custom::{CustomParameter, CustomParameters};
pub use endpoint::{
    EndpointCatalog, EndpointDescriptor, EndpointDescriptorBuilder, StaticEndpointCatalog,
};
pub use error::{Error, Result};
pub use link::{LinkedParameter, link};
pub use method::Method;
pub use params::{
    BindingSource, CallerParameter, EndpointParameter, ParameterMapping, SimpleType, TypeRef,
};
pub use pipeline::{Next, Pipeline, PipelineBuilder, Stage, StageFuture};
pub use request::{Request, RequestBuilder, header_pair};
pub use response::Response;
pub use route::{
    RouteParameter, RouteSynthesizer, RouteTemplate, TemplateRouteSynthesizer, UrlValues,
};
pub use value::{DEFAULT_MAX_DEPTH, FlattenMode, ValueShape};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};

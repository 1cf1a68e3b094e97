//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tether_core::prelude::*;
//! ```

pub use crate::{
    BindingSource, CallId, CallerParameter, ContentType, CustomParameters, EndpointCatalog,
    EndpointDescriptor, EndpointParameter, Error, HttpClient, Method, Next, ParameterMapping,
    Pipeline, Request, RequestBuildContext, Response, Result, Stage, StageFuture,
    StaticEndpointCatalog, TypeRef,
};

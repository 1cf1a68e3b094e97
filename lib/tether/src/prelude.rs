//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy glob
//! importing:
//!
//! ```ignore
//! use tether::prelude::*;
//! ```

pub use crate::{
    BindingSource, CallIntent, CallerParameter, ClientConfig, ContentType, CorrelationStore,
    CustomParameters, EndpointDescriptor, EndpointParameter, Error, HttpClient, HyperClient,
    InMemoryCorrelationStore, Invocation, Method, Next, ParameterMapping, RecordedFailure,
    Request, RequestBuildContext, Response, Result, Stage, StageFuture, StaticEndpointCatalog,
    StatusCode, TestClient, TypeRef, header,
};
pub use serde::{Deserialize, Serialize};

//! Per-call mutable state threaded through the pipeline.

use std::sync::Arc;

use http::HeaderMap;
use serde_json::Value;

use crate::request::header_pair;
use crate::{
    CallId, ContentType, CustomParameters, EndpointDescriptor, Error, LinkedParameter, Method,
    Result, UrlValues,
};

/// Which binding stage wrote a url value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlValueOrigin {
    /// Route-bound parameter.
    Route,
    /// Query-bound or unattributed parameter.
    Query,
}

/// Mutable state of one call, created at call start and consumed by the
/// finalize stage.
///
/// A context is never shared between calls. `body` is an `Option<Value>`:
/// `Some(Value::Null)` is a deliberate null body and is still sent.
#[derive(Debug)]
pub struct RequestBuildContext {
    endpoint: Arc<EndpointDescriptor>,
    parameters: Vec<LinkedParameter>,
    custom: CustomParameters,
    call_id: CallId,
    max_depth: usize,
    method: Option<Method>,
    content_type: Option<ContentType>,
    url_values: UrlValues,
    origins: Vec<(String, UrlValueOrigin)>,
    headers: HeaderMap,
    body: Option<Value>,
}

impl RequestBuildContext {
    /// Create the context of one call.
    #[must_use]
    pub fn new(
        endpoint: Arc<EndpointDescriptor>,
        parameters: Vec<LinkedParameter>,
        custom: CustomParameters,
        call_id: CallId,
        max_depth: usize,
    ) -> Self {
        Self {
            endpoint,
            parameters,
            custom,
            call_id,
            max_depth,
            method: None,
            content_type: None,
            url_values: UrlValues::new(),
            origins: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    /// Linked parameters of this call.
    #[must_use]
    pub fn parameters(&self) -> &[LinkedParameter] {
        &self.parameters
    }

    /// Linked parameters bound through the endpoint's binding source.
    pub fn endpoint_bound(&self) -> impl Iterator<Item = &LinkedParameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.is_endpoint_bound())
    }

    /// Out-of-band parameters of this call.
    #[must_use]
    pub const fn custom(&self) -> &CustomParameters {
        &self.custom
    }

    /// Correlation id of this call.
    #[must_use]
    pub const fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Nesting limit for flattening.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// HTTP method, set by the first stage.
    #[must_use]
    pub const fn method(&self) -> Option<Method> {
        self.method
    }

    /// Override the HTTP method.
    pub const fn set_method(&mut self, method: Method) {
        self.method = Some(method);
    }

    /// Body content type, set by the first stage.
    #[must_use]
    pub const fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Override the body content type.
    pub const fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = Some(content_type);
    }

    /// Route and query values collected so far.
    #[must_use]
    pub const fn url_values(&self) -> &UrlValues {
        &self.url_values
    }

    /// Insert a url value without origin tracking; the last write wins.
    pub fn insert_url_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.url_values.insert(key, value)
    }

    /// Remove a url value.
    pub fn remove_url_value(&mut self, key: &str) -> Option<Value> {
        self.origins
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
        self.url_values.remove(key)
    }

    /// Insert a url value written by a route or query binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RouteQueryNameCollision`] when the key was already
    /// written with the other origin.
    pub fn bind_url_value(
        &mut self,
        key: impl Into<String>,
        value: Value,
        origin: UrlValueOrigin,
    ) -> Result<()> {
        let key = key.into();
        match self
            .origins
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            Some((_, existing)) if *existing != origin => {
                return Err(Error::route_query_collision(key));
            }
            Some(_) => {}
            None => self.origins.push((key.clone(), origin)),
        }
        self.url_values.insert(key, value);
        Ok(())
    }

    /// Headers collected so far.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Append a header value, keeping earlier values of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name or value cannot be sent.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Replace every value of a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name or value cannot be sent.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Body collected so far; `Some(Value::Null)` is an explicit null body.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns `true` once a stage has set a body, even a null one.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Set the body, replacing any earlier one.
    pub fn set_body(&mut self, body: Value) -> Option<Value> {
        self.body.replace(body)
    }

    /// Drop the body so none is sent.
    pub fn clear_body(&mut self) -> Option<Value> {
        self.body.take()
    }
}

//! Synthesized wire requests.
//!
//! A [`Request`] is what the finalize stage emits and what an
//! [`HttpClient`](crate::HttpClient) sends. Headers form an ordered multimap
//! so repeated header values survive.
//!
//! # Example
//!
//! ```
//! use tether_core::{Method, Request};
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::builder(Method::Get, "http://localhost/users".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .unwrap()
//!     .build();
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Extensions;

use crate::{Error, Method, Result};

/// An HTTP request with method, URL, headers, optional body and extensions.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HeaderMap,
    body: Option<B>,
    extensions: Extensions,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// All values of a header, in insertion order.
    #[must_use]
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Typed extensions (call id, route template...).
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to extensions.
    #[must_use]
    pub const fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Consume into (method, url, headers, body, extensions).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HeaderMap, Option<B>, Extensions) {
        (
            self.method,
            self.url,
            self.headers,
            self.body,
            self.extensions,
        )
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HeaderMap,
    body: Option<B>,
    extensions: Extensions,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// Appends a header, keeping earlier values of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name or value cannot be sent.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Appends every header of a map.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut last = None;
        for (name, value) in headers {
            if let Some(name) = name {
                last = Some(name);
            }
            if let Some(name) = &last {
                self.headers.append(name.clone(), value);
            }
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Inserts a typed extension.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            extensions: self.extensions,
        }
    }
}

/// Validate a header name and value.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] if either part cannot be sent.
pub fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| Error::invalid_header(name, err.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|err| Error::invalid_header(name, err.to_string()))?;
    Ok((header_name, header_value))
}

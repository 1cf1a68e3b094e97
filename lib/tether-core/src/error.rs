//! Error types for tether.
//!
//! Every synthesis error is raised before any network I/O happens, and each
//! message names the offending parameter or endpoint.

use derive_more::{Display, Error, From};

/// Main error type for tether operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    // ------------------------------------------------------------------------
    // Synthesis errors
    // ------------------------------------------------------------------------
    /// More than one endpoint parameter declares a body (or form) binding.
    #[display("endpoint '{endpoint}' declares more than one body parameter: {parameters}")]
    #[from(skip)]
    DuplicateBodyBinding {
        /// Endpoint identifier.
        endpoint: String,
        /// Comma separated names of the conflicting parameters.
        parameters: String,
    },

    /// A complex value was bound to a header.
    #[display("parameter '{name}': complex types in header are not supported")]
    #[from(skip)]
    UnsupportedHeaderType {
        /// Wire name of the parameter.
        name: String,
    },

    /// A null value was bound to a route segment.
    #[display("parameter '{name}': route values cannot be null, routing would not match")]
    #[from(skip)]
    NullRouteValue {
        /// Wire name of the parameter.
        name: String,
    },

    /// A non-simple value was bound to a route segment.
    #[display("parameter '{name}': complex arguments in route are not supported")]
    #[from(skip)]
    UnsupportedRouteType {
        /// Wire name of the parameter.
        name: String,
    },

    /// A sequence of complex elements reached the query string.
    #[display("parameter '{name}': {reason}")]
    #[from(skip)]
    UnsupportedQueryCollectionElement {
        /// Wire name of the parameter.
        name: String,
        /// Human readable reason, depends on the binding path.
        reason: &'static str,
    },

    /// A route-bound and a query-bound parameter resolve to the same wire name.
    #[display("parameter '{name}' is bound both to the route and to the query string")]
    #[from(skip)]
    RouteQueryNameCollision {
        /// Colliding wire name.
        name: String,
    },

    /// An argument matching no endpoint parameter carries no mapping, so it
    /// has nowhere to go.
    #[display("parameter '{name}': matches no endpoint parameter and has no mapping")]
    #[from(skip)]
    UnmappedParameter {
        /// Caller-side name.
        name: String,
    },

    /// The route synthesizer could not produce a path.
    #[display("could not generate uri for endpoint '{endpoint}' (template '{template}')")]
    #[from(skip)]
    RouteSynthesisFailure {
        /// Endpoint identifier.
        endpoint: String,
        /// Route template of the endpoint.
        template: String,
    },

    /// The body serializer does not know how to encode the content type.
    #[display("unsupported content type for request body: {_0}")]
    #[from(skip)]
    UnsupportedContentType(#[error(not(source))] String),

    /// A complex value nests deeper than the configured limit while flattening.
    #[display("parameter '{name}': value nests deeper than {max_depth} levels")]
    #[from(skip)]
    FlattenDepthExceeded {
        /// Key reached when the limit was hit.
        name: String,
        /// Configured limit.
        max_depth: usize,
    },

    /// A header name or value cannot be sent over the wire.
    #[display("invalid header '{name}': {message}")]
    #[from(skip)]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Error message.
        message: String,
    },

    // ------------------------------------------------------------------------
    // Configuration errors
    // ------------------------------------------------------------------------
    /// The endpoint catalog has no descriptor for the requested endpoint.
    #[display("unknown endpoint: {_0}")]
    #[from(skip)]
    UnknownEndpoint(#[error(not(source))] String),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    // ------------------------------------------------------------------------
    // Serialization errors
    // ------------------------------------------------------------------------
    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form or query string serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    // ------------------------------------------------------------------------
    // Transport errors
    // ------------------------------------------------------------------------
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a duplicate body binding error.
    #[must_use]
    pub fn duplicate_body<'a>(
        endpoint: impl Into<String>,
        parameters: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::DuplicateBodyBinding {
            endpoint: endpoint.into(),
            parameters: parameters.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    /// Create an unsupported header type error.
    #[must_use]
    pub fn unsupported_header(name: impl Into<String>) -> Self {
        Self::UnsupportedHeaderType { name: name.into() }
    }

    /// Create a null route value error.
    #[must_use]
    pub fn null_route(name: impl Into<String>) -> Self {
        Self::NullRouteValue { name: name.into() }
    }

    /// Create an unsupported route type error.
    #[must_use]
    pub fn unsupported_route(name: impl Into<String>) -> Self {
        Self::UnsupportedRouteType { name: name.into() }
    }

    /// Create a route/query collision error.
    #[must_use]
    pub fn route_query_collision(name: impl Into<String>) -> Self {
        Self::RouteQueryNameCollision { name: name.into() }
    }

    /// Create an unmapped parameter error.
    #[must_use]
    pub fn unmapped(name: impl Into<String>) -> Self {
        Self::UnmappedParameter { name: name.into() }
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the error was raised while synthesizing the request,
    /// i.e. before anything was sent.
    #[must_use]
    pub const fn is_synthesis(&self) -> bool {
        matches!(
            self,
            Self::DuplicateBodyBinding { .. }
                | Self::UnsupportedHeaderType { .. }
                | Self::NullRouteValue { .. }
                | Self::UnsupportedRouteType { .. }
                | Self::UnsupportedQueryCollectionElement { .. }
                | Self::RouteQueryNameCollision { .. }
                | Self::UnmappedParameter { .. }
                | Self::RouteSynthesisFailure { .. }
                | Self::UnsupportedContentType(_)
                | Self::FlattenDepthExceeded { .. }
                | Self::InvalidHeader { .. }
        )
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::duplicate_body("Orders.Create", ["order", "audit"]);
        assert_eq!(
            err.to_string(),
            "endpoint 'Orders.Create' declares more than one body parameter: order, audit"
        );

        let err = Error::null_route("id");
        assert_eq!(
            err.to_string(),
            "parameter 'id': route values cannot be null, routing would not match"
        );

        let err = Error::unsupported_header("filter");
        assert_eq!(
            err.to_string(),
            "parameter 'filter': complex types in header are not supported"
        );

        let err = Error::RouteSynthesisFailure {
            endpoint: "Users.Get".to_string(),
            template: "/users/{id}".to_string(),
        };
        assert!(err.to_string().starts_with("could not generate uri"));
    }

    #[test]
    fn error_is_synthesis() {
        assert!(Error::unsupported_route("id").is_synthesis());
        assert!(Error::route_query_collision("id").is_synthesis());
        assert!(Error::unmapped("extra").is_synthesis());
        assert!(Error::UnsupportedContentType("text/csv".to_string()).is_synthesis());
        assert!(!Error::Timeout.is_synthesis());
        assert!(!Error::UnknownEndpoint("x".to_string()).is_synthesis());
    }

    #[test]
    fn error_is_timeout() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::connection("refused").is_timeout());
    }

    #[test]
    fn error_is_connection() {
        assert!(Error::connection("failed").is_connection());
        assert!(!Error::Timeout.is_connection());
    }
}

//! Call-time-only parameters.
//!
//! Custom parameters are not tied to any endpoint parameter. Three built-in
//! variants reach the wire (header, body, route-or-query); named values and
//! typed markers only drive custom stages, which look them up by name or by
//! type.

use http::Extensions;
use serde_json::Value;

/// A built-in or named custom parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomParameter {
    /// Header sent as-is; sequences produce repeated headers.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: Value,
    },
    /// Request body, replaces any other body; `null` is still sent.
    Body(Value),
    /// Merged into the url values: a route segment when the template names
    /// it, a query value otherwise.
    RouteOrQuery {
        /// Key.
        name: String,
        /// Value, flattened like a query value.
        value: Value,
    },
    /// Never sent; visible to custom stages only.
    Named {
        /// Key.
        name: String,
        /// Value.
        value: Value,
    },
}

impl CustomParameter {
    /// Name of the parameter, `None` for a body.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Header { name, .. }
            | Self::RouteOrQuery { name, .. }
            | Self::Named { name, .. } => Some(name),
            Self::Body(_) => None,
        }
    }

    /// Value of the parameter.
    #[must_use]
    pub const fn value(&self) -> &Value {
        match self {
            Self::Header { value, .. }
            | Self::RouteOrQuery { value, .. }
            | Self::Named { value, .. }
            | Self::Body(value) => value,
        }
    }
}

/// The set of custom parameters supplied with one call.
#[derive(Debug, Clone, Default)]
pub struct CustomParameters {
    entries: Vec<CustomParameter>,
    typed: Extensions,
}

impl CustomParameters {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom parameter.
    pub fn push(&mut self, parameter: CustomParameter) {
        self.entries.push(parameter);
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(CustomParameter::Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, value: impl Into<Value>) -> Self {
        self.push(CustomParameter::Body(value.into()));
        self
    }

    /// Add a route or query value.
    #[must_use]
    pub fn with_route_or_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(CustomParameter::RouteOrQuery {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a named value for custom stages.
    #[must_use]
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(CustomParameter::Named {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a typed marker for custom stages. A marker of the same type is
    /// replaced.
    #[must_use]
    pub fn with_marker<T: Clone + Send + Sync + 'static>(mut self, marker: T) -> Self {
        self.typed.insert(marker);
        self
    }

    /// Look up a typed marker.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.typed.get::<T>()
    }

    /// Returns `true` when a marker of type `T` was supplied.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Look up the value of the last parameter with the given name, whatever
    /// its variant.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name() == Some(name))
            .map(CustomParameter::value)
    }

    /// All entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CustomParameter> {
        self.entries.iter()
    }

    /// Returns `true` if no parameter and no marker was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.typed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TraceMarker(&'static str);

    #[test]
    fn lookup_by_name_returns_last_entry() {
        let custom = CustomParameters::new()
            .with_header("X-Trace", "abc")
            .with_named("tenant", "acme")
            .with_named("tenant", "globex");

        check!(custom.find("X-Trace") == Some(&json!("abc")));
        check!(custom.find("tenant") == Some(&json!("globex")));
        check!(custom.find("missing").is_none());
    }

    #[test]
    fn lookup_by_type() {
        let custom = CustomParameters::new().with_marker(TraceMarker("on"));

        check!(custom.contains::<TraceMarker>());
        check!(custom.get::<TraceMarker>() == Some(&TraceMarker("on")));
        check!(!custom.contains::<u32>());
    }

    #[test]
    fn body_has_no_name() {
        let custom = CustomParameters::new().with_body(Value::Null);
        let entry = custom.iter().next();
        check!(entry.and_then(CustomParameter::name).is_none());
        check!(entry.map(CustomParameter::value) == Some(&Value::Null));
    }

    #[test]
    fn empty_set() {
        check!(CustomParameters::new().is_empty());
        check!(!CustomParameters::new().with_marker(1_u8).is_empty());
    }
}

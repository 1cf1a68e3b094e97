//! Endpoint descriptors and the catalog that provides them.
//!
//! A descriptor is computed once per endpoint from the host framework's
//! metadata; binding sources are resolved at that point and never
//! re-derived per call.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{BindingSource, EndpointParameter, Error, Method, Result, RouteTemplate};

/// Everything the pipeline needs to know about one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    id: String,
    method: Method,
    route: RouteTemplate,
    route_values: Vec<(String, String)>,
    parameters: Vec<EndpointParameter>,
}

impl EndpointDescriptor {
    /// Start describing an endpoint.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        method: Method,
        template: impl Into<String>,
    ) -> EndpointDescriptorBuilder {
        EndpointDescriptorBuilder {
            id: id.into(),
            method,
            template: template.into(),
            route_values: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Endpoint identifier, e.g. `Users.Get`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Route template.
    #[must_use]
    pub const fn route(&self) -> &RouteTemplate {
        &self.route
    }

    /// Required route values identifying the endpoint (controller, action,
    /// area...).
    pub fn route_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.route_values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Required route value for a key, compared ASCII case-insensitively.
    #[must_use]
    pub fn route_value(&self, key: &str) -> Option<&str> {
        self.route_values
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Declared parameters, in signature order.
    #[must_use]
    pub fn parameters(&self) -> &[EndpointParameter] {
        &self.parameters
    }

    /// Parameters declaring a body or form binding.
    pub fn body_parameters(&self) -> impl Iterator<Item = &EndpointParameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.binding().is_body())
    }

    /// Returns `true` if a parameter declares form binding, which makes the
    /// body `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn consumes_form(&self) -> bool {
        self.parameters
            .iter()
            .any(|parameter| parameter.binding() == BindingSource::Form)
    }
}

/// Builder for [`EndpointDescriptor`].
#[derive(Debug, Clone)]
pub struct EndpointDescriptorBuilder {
    id: String,
    method: Method,
    template: String,
    route_values: Vec<(String, String)>,
    parameters: Vec<EndpointParameter>,
}

impl EndpointDescriptorBuilder {
    /// Add a required route value.
    #[must_use]
    pub fn route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.push((key.into(), value.into()));
        self
    }

    /// Add a declared parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: EndpointParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Add several declared parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: impl IntoIterator<Item = EndpointParameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Build the descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the route template cannot be parsed.
    pub fn build(self) -> Result<EndpointDescriptor> {
        Ok(EndpointDescriptor {
            route: RouteTemplate::parse(self.template)?,
            id: self.id,
            method: self.method,
            route_values: self.route_values,
            parameters: self.parameters,
        })
    }
}

/// Provides endpoint descriptors by identifier.
///
/// This is the host framework's metadata provider; a missing descriptor is a
/// configuration error.
pub trait EndpointCatalog: Send + Sync {
    /// Look up a descriptor.
    fn find(&self, id: &str) -> Option<Arc<EndpointDescriptor>>;

    /// Look up a descriptor, failing with [`Error::UnknownEndpoint`].
    fn resolve(&self, id: &str) -> Result<Arc<EndpointDescriptor>> {
        self.find(id)
            .ok_or_else(|| Error::UnknownEndpoint(id.to_string()))
    }
}

/// In-memory catalog keyed by endpoint identifier.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointCatalog {
    endpoints: HashMap<String, Arc<EndpointDescriptor>>,
}

impl StaticEndpointCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one with the same id.
    pub fn register(&mut self, descriptor: EndpointDescriptor) {
        self.endpoints
            .insert(descriptor.id().to_string(), Arc::new(descriptor));
    }

    /// Register a descriptor, builder style.
    #[must_use]
    pub fn with(mut self, descriptor: EndpointDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl FromIterator<EndpointDescriptor> for StaticEndpointCatalog {
    fn from_iter<I: IntoIterator<Item = EndpointDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.register(descriptor);
        }
        catalog
    }
}

impl EndpointCatalog for StaticEndpointCatalog {
    fn find(&self, id: &str) -> Option<Arc<EndpointDescriptor>> {
        self.endpoints.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::TypeRef;

    fn create_order() -> EndpointDescriptor {
        EndpointDescriptor::builder("Orders.Create", Method::Post, "/orders/{tenant}")
            .route_value("controller", "Orders")
            .route_value("action", "Create")
            .parameter(
                EndpointParameter::new("tenant", TypeRef::string()).bound_to(BindingSource::Route),
            )
            .parameter(
                EndpointParameter::new("order", TypeRef::object("Order"))
                    .bound_to(BindingSource::Body),
            )
            .build()
            .expect("descriptor")
    }

    #[test]
    fn descriptor_accessors() {
        let descriptor = create_order();

        check!(descriptor.id() == "Orders.Create");
        check!(descriptor.method() == Method::Post);
        check!(descriptor.route().as_str() == "/orders/{tenant}");
        check!(descriptor.route_value("CONTROLLER") == Some("Orders"));
        check!(descriptor.route_values().count() == 2);
        check!(descriptor.body_parameters().count() == 1);
        check!(!descriptor.consumes_form());
    }

    #[test]
    fn descriptor_consumes_form() {
        let descriptor = EndpointDescriptor::builder("Account.Login", Method::Post, "/login")
            .parameter(
                EndpointParameter::new("login", TypeRef::object("Login"))
                    .bound_to(BindingSource::Form),
            )
            .build()
            .expect("descriptor");
        check!(descriptor.consumes_form());
    }

    #[test]
    fn descriptor_rejects_invalid_template() {
        check!(EndpointDescriptor::builder("Bad", Method::Get, "/users/{id").build().is_err());
    }

    #[test]
    fn catalog_resolve() {
        let catalog = StaticEndpointCatalog::new().with(create_order());

        check!(catalog.len() == 1);
        check!(catalog.resolve("Orders.Create").is_ok());
        let_assert!(Err(Error::UnknownEndpoint(id)) = catalog.resolve("Orders.Delete"));
        check!(id == "Orders.Delete");
    }
}

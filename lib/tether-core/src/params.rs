//! Parameter model.
//!
//! Three independent namespaces describe one call:
//! - [`EndpointParameter`]: what the server-side endpoint declares, with its
//!   binding source resolved once when the endpoint is described,
//! - [`CallerParameter`]: what the test author passes, possibly renamed,
//!   retyped, added or removed relative to the endpoint,
//! - [`CustomParameters`](crate::CustomParameters): call-time-only values.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::Result;

// ============================================================================
// Type references
// ============================================================================

/// Scalar types the host framework binds from a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleType {
    /// Boolean.
    Bool,
    /// Any integer width, signed or not.
    Integer,
    /// Floating point.
    Float,
    /// Fixed point decimal.
    Decimal,
    /// String.
    String,
    /// Single character.
    Char,
    /// Enumeration, sent by name or value.
    Enum,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time, with or without offset.
    DateTime,
    /// Time span.
    Duration,
    /// UUID / GUID.
    Uuid,
}

/// Static type of a parameter as seen by the binding rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A simple (scalar) type.
    Simple(SimpleType),
    /// Nullable form of another type.
    Optional(Box<TypeRef>),
    /// Enumerable of another type.
    Sequence(Box<TypeRef>),
    /// Complex object type, by name.
    Object(String),
    /// Unknown statically: classification uses the runtime value shape.
    Dynamic,
}

impl TypeRef {
    /// Shorthand for `Simple(SimpleType::Integer)`.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Simple(SimpleType::Integer)
    }

    /// Shorthand for `Simple(SimpleType::String)`.
    #[must_use]
    pub const fn string() -> Self {
        Self::Simple(SimpleType::String)
    }

    /// Shorthand for `Object(name)`.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// Shorthand for `Sequence(element)`.
    #[must_use]
    pub fn sequence(element: Self) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Shorthand for `Optional(inner)`.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Strip any number of `Optional` wrappers.
    #[must_use]
    pub fn non_nullable(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner.non_nullable(),
            other => other,
        }
    }

    /// Returns `true` for simple types and their nullable forms.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        matches!(self.non_nullable(), Self::Simple(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(simple) => write!(f, "{simple:?}"),
            Self::Optional(inner) => write!(f, "{inner}?"),
            Self::Sequence(inner) => write!(f, "[{inner}]"),
            Self::Object(name) => f.write_str(name),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

// ============================================================================
// Endpoint side
// ============================================================================

/// Where the host framework expects a parameter value to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingSource {
    /// Route segment (e.g. `/users/{id}`).
    Route,
    /// Query string.
    Query,
    /// Request body, serialized as JSON.
    Body,
    /// Request body, serialized as `application/x-www-form-urlencoded`.
    Form,
    /// Request header.
    Header,
    /// Request-scoped service, never on the wire.
    Service,
    /// Custom model binder, never on the wire.
    ModelBinder,
    /// No attribute: the framework infers the source.
    #[default]
    None,
}

impl BindingSource {
    /// Returns `true` for the sources that bind the request body.
    #[must_use]
    pub const fn is_body(self) -> bool {
        matches!(self, Self::Body | Self::Form)
    }

    /// Returns `true` for the sources that never reach the wire.
    #[must_use]
    pub const fn is_skipped(self) -> bool {
        matches!(self, Self::Service | Self::ModelBinder)
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Route => "route",
            Self::Query => "query",
            Self::Body => "body",
            Self::Form => "form",
            Self::Header => "header",
            Self::Service => "service",
            Self::ModelBinder => "model-binder",
            Self::None => "none",
        };
        f.write_str(label)
    }
}

/// A parameter as declared by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParameter {
    name: String,
    declared_type: TypeRef,
    binding: BindingSource,
    attribute_name: Option<String>,
}

impl EndpointParameter {
    /// Create a parameter without binding attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declared_type,
            binding: BindingSource::None,
            attribute_name: None,
        }
    }

    /// Set the binding attribute.
    #[must_use]
    pub fn bound_to(mut self, binding: BindingSource) -> Self {
        self.binding = binding;
        self
    }

    /// Set the name declared on the binding attribute.
    #[must_use]
    pub fn with_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    /// Parameter name in the endpoint signature.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub const fn declared_type(&self) -> &TypeRef {
        &self.declared_type
    }

    /// Binding source.
    #[must_use]
    pub const fn binding(&self) -> BindingSource {
        self.binding
    }

    /// Name given on the binding attribute, if any.
    #[must_use]
    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute_name.as_deref()
    }

    /// Name used on the wire: the attribute name when present and non-empty,
    /// the parameter name otherwise.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        match self.attribute_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}

// ============================================================================
// Caller side
// ============================================================================

/// Binding override carried by added or transformed caller parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterMapping {
    /// Not sent; only visible to custom stages.
    None,
    /// Query string (or route, when the template names it).
    Query,
    /// Request body.
    Body,
    /// Request header.
    Header,
}

/// A parameter as passed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerParameter {
    name: String,
    ty: TypeRef,
    value: Value,
    mapping: Option<ParameterMapping>,
}

impl CallerParameter {
    /// Create a caller parameter from an already converted value.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef, value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
            mapping: None,
        }
    }

    /// Create a caller parameter from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn from_serialize<T: Serialize + ?Sized>(
        name: impl Into<String>,
        ty: TypeRef,
        value: &T,
    ) -> Result<Self> {
        Ok(Self::new(name, ty, serde_json::to_value(value)?))
    }

    /// Mark this parameter as added or transformed, with its binding override.
    #[must_use]
    pub fn mapped(mut self, mapping: ParameterMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Parameter name as seen by the caller.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Caller-side type.
    #[must_use]
    pub const fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Argument value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Binding override, set only on added or transformed parameters.
    #[must_use]
    pub const fn mapping(&self) -> Option<ParameterMapping> {
        self.mapping
    }
}

//! Value classification and flattening.
//!
//! Argument values travel as [`serde_json::Value`] trees. The static
//! [`TypeRef`] refines what the runtime shape cannot tell (the element type
//! of an empty sequence, for instance); everything else is decided from the
//! value itself.
//!
//! A `Value` tree is owned and acyclic, so flattening always terminates; the
//! depth limit turns pathological nesting into an error instead of a deep
//! recursion.

use serde_json::{Map, Value};

use crate::{Error, Result, TypeRef};

/// Default maximum nesting depth accepted while flattening complex values.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// How a value is treated by the binding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// `null`.
    Null,
    /// Scalar bound from a single string.
    Simple,
    /// Enumerable, sent as repeated values.
    Sequence {
        /// Elements are not simple.
        complex_elements: bool,
    },
    /// Object with fields.
    Complex,
}

impl ValueShape {
    /// Classify a value given its static type.
    #[must_use]
    pub fn classify(ty: &TypeRef, value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Object(_) => Self::Complex,
            Value::Array(items) => Self::Sequence {
                complex_elements: has_complex_elements(ty, items),
            },
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Self::Simple,
        }
    }

    /// Returns `true` for simple values and `null`.
    #[must_use]
    pub const fn is_simple_or_null(self) -> bool {
        matches!(self, Self::Simple | Self::Null)
    }
}

fn has_complex_elements(ty: &TypeRef, items: &[Value]) -> bool {
    if let TypeRef::Sequence(element) = ty.non_nullable() {
        match element.non_nullable() {
            TypeRef::Simple(_) => return false,
            TypeRef::Object(_) | TypeRef::Sequence(_) => return true,
            TypeRef::Dynamic | TypeRef::Optional(_) => {}
        }
    }
    items
        .iter()
        .any(|item| matches!(item, Value::Object(_) | Value::Array(_)))
}

/// Which binding path reached the flattener; only changes the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenMode {
    /// Unattributed parameter treated as query, or a mapped parameter.
    Implicit,
    /// Parameter explicitly bound to the query string.
    Explicit,
}

impl FlattenMode {
    const fn complex_elements_reason(self) -> &'static str {
        match self {
            Self::Implicit => "enumerable with complex element type is not supported",
            Self::Explicit => "complex type in query collection is not supported",
        }
    }
}

/// Flatten a value into the key/value pairs merged into the url values.
///
/// - `null`, simple values and sequences of simple values map to a single pair,
/// - complex values map to one pair per leaf, keyed `parent.child`; nested
///   objects are recursed into, nested sequences and scalars are kept as-is.
///
/// # Errors
///
/// Fails on sequences of complex elements and on values nested deeper than
/// `max_depth`.
pub fn flatten(
    name: &str,
    ty: &TypeRef,
    value: &Value,
    mode: FlattenMode,
    max_depth: usize,
) -> Result<Vec<(String, Value)>> {
    match (ValueShape::classify(ty, value), value) {
        (ValueShape::Sequence { complex_elements: true }, _) => {
            Err(Error::UnsupportedQueryCollectionElement {
                name: name.to_string(),
                reason: mode.complex_elements_reason(),
            })
        }
        (ValueShape::Complex, Value::Object(fields)) => {
            let mut pairs = Vec::new();
            flatten_object(name, fields, 1, max_depth, &mut pairs)?;
            Ok(pairs)
        }
        _ => Ok(vec![(name.to_string(), value.clone())]),
    }
}

fn flatten_object(
    prefix: &str,
    fields: &Map<String, Value>,
    depth: usize,
    max_depth: usize,
    pairs: &mut Vec<(String, Value)>,
) -> Result<()> {
    if depth > max_depth {
        return Err(Error::FlattenDepthExceeded {
            name: prefix.to_string(),
            max_depth,
        });
    }
    for (field, value) in fields {
        let key = format!("{prefix}.{field}");
        match value {
            Value::Object(nested) => flatten_object(&key, nested, depth + 1, max_depth, pairs)?,
            other => pairs.push((key, other.clone())),
        }
    }
    Ok(())
}

/// Header values for a parameter: one entry per element of a sequence.
///
/// `null` produces no header at all.
///
/// # Errors
///
/// Fails with [`Error::UnsupportedHeaderType`] on complex values and on
/// sequences of complex elements.
pub fn header_values(name: &str, ty: &TypeRef, value: &Value) -> Result<Vec<String>> {
    match (ValueShape::classify(ty, value), value) {
        (ValueShape::Null, _) => Ok(Vec::new()),
        (ValueShape::Sequence { complex_elements: false }, Value::Array(items)) => {
            Ok(items.iter().filter_map(render).collect())
        }
        (ValueShape::Simple, _) => Ok(render(value).into_iter().collect()),
        _ => Err(Error::unsupported_header(name)),
    }
}

/// Render a scalar as it appears on the wire.
///
/// Strings are used verbatim, `null` renders to nothing, and nested
/// structures fall back to compact JSON.
#[must_use]
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Render a value as a list of wire strings: sequences expand to their
/// elements, `null` entries are dropped.
#[must_use]
pub fn render_all(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(render).collect(),
        other => render(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::SimpleType;

    fn flatten_default(name: &str, ty: &TypeRef, value: &Value) -> Result<Vec<(String, Value)>> {
        flatten(name, ty, value, FlattenMode::Explicit, DEFAULT_MAX_DEPTH)
    }

    #[test]
    fn classify_by_runtime_shape() {
        check!(ValueShape::classify(&TypeRef::Dynamic, &Value::Null) == ValueShape::Null);
        check!(ValueShape::classify(&TypeRef::Dynamic, &json!(5)) == ValueShape::Simple);
        check!(ValueShape::classify(&TypeRef::Dynamic, &json!("x")) == ValueShape::Simple);
        check!(ValueShape::classify(&TypeRef::Dynamic, &json!({ "a": 1 })) == ValueShape::Complex);
        check!(
            ValueShape::classify(&TypeRef::Dynamic, &json!([1, 2]))
                == ValueShape::Sequence {
                    complex_elements: false
                }
        );
        check!(
            ValueShape::classify(&TypeRef::Dynamic, &json!([{ "a": 1 }]))
                == ValueShape::Sequence {
                    complex_elements: true
                }
        );
    }

    #[test]
    fn classify_empty_sequence_uses_static_element_type() {
        let ty = TypeRef::sequence(TypeRef::object("Item"));
        check!(
            ValueShape::classify(&ty, &json!([]))
                == ValueShape::Sequence {
                    complex_elements: true
                }
        );

        let ty = TypeRef::sequence(TypeRef::Simple(SimpleType::Uuid));
        check!(
            ValueShape::classify(&ty, &json!([]))
                == ValueShape::Sequence {
                    complex_elements: false
                }
        );
    }

    #[test]
    fn flatten_null_and_simple() {
        let pairs = flatten_default("page", &TypeRef::integer(), &Value::Null).expect("flatten");
        check!(pairs == vec![("page".to_string(), Value::Null)]);

        let pairs = flatten_default("page", &TypeRef::integer(), &json!(3)).expect("flatten");
        check!(pairs == vec![("page".to_string(), json!(3))]);
    }

    #[test]
    fn flatten_simple_sequence_is_kept_whole() {
        let ty = TypeRef::sequence(TypeRef::string());
        let pairs = flatten_default("tags", &ty, &json!(["a", "b"])).expect("flatten");
        check!(pairs == vec![("tags".to_string(), json!(["a", "b"]))]);
    }

    #[test]
    fn flatten_complex_uses_dotted_keys() {
        let value = json!({ "A": "x", "B": 2 });
        let pairs = flatten_default("filter", &TypeRef::object("Filter"), &value).expect("flatten");
        check!(
            pairs
                == vec![
                    ("filter.A".to_string(), json!("x")),
                    ("filter.B".to_string(), json!(2)),
                ]
        );
    }

    #[test]
    fn flatten_recurses_into_nested_objects_only() {
        let value = json!({
            "Range": { "From": 1, "To": 9 },
            "Tags": ["a", "b"],
            "Name": null,
        });
        let mut pairs = flatten_default("q", &TypeRef::object("Query"), &value).expect("flatten");
        pairs.sort_by(|left, right| left.0.cmp(&right.0));
        check!(
            pairs
                == vec![
                    ("q.Name".to_string(), Value::Null),
                    ("q.Range.From".to_string(), json!(1)),
                    ("q.Range.To".to_string(), json!(9)),
                    ("q.Tags".to_string(), json!(["a", "b"])),
                ]
        );
    }

    #[test]
    fn flatten_is_idempotent() {
        let value = json!({ "b": { "c": 1, "a": [1, 2] }, "a": "z" });
        let ty = TypeRef::object("Nested");
        let first = flatten_default("root", &ty, &value).expect("flatten");
        let second = flatten_default("root", &ty, &value).expect("flatten");
        check!(first == second);
    }

    #[test]
    fn flatten_rejects_complex_elements_with_path_specific_message() {
        let value = json!([{ "a": 1 }]);

        let_assert!(
            Err(Error::UnsupportedQueryCollectionElement { name, reason }) =
                flatten("items", &TypeRef::Dynamic, &value, FlattenMode::Implicit, 8)
        );
        check!(name == "items");
        check!(reason == "enumerable with complex element type is not supported");

        let_assert!(
            Err(err) = flatten("items", &TypeRef::Dynamic, &value, FlattenMode::Explicit, 8)
        );
        check!(err.to_string().contains("complex type"));
    }

    #[test]
    fn flatten_enforces_depth_limit() {
        let value = json!({ "a": { "b": { "c": 1 } } });
        let_assert!(
            Err(Error::FlattenDepthExceeded { name, max_depth }) =
                flatten("root", &TypeRef::Dynamic, &value, FlattenMode::Explicit, 2)
        );
        check!(name == "root.a.b");
        check!(max_depth == 2);

        check!(flatten("root", &TypeRef::Dynamic, &value, FlattenMode::Explicit, 3).is_ok());
    }

    #[test]
    fn header_values_expand_sequences() {
        let values = header_values("X-Tag", &TypeRef::Dynamic, &json!(["a", 1, null, true]))
            .expect("header values");
        check!(values == vec!["a", "1", "true"]);

        check!(header_values("X-Tag", &TypeRef::Dynamic, &Value::Null)
            .expect("null")
            .is_empty());
        let values = header_values("X-Tag", &TypeRef::Dynamic, &json!("abc")).expect("simple");
        check!(values == vec!["abc"]);
    }

    #[test]
    fn header_values_reject_complex() {
        let_assert!(
            Err(Error::UnsupportedHeaderType { name }) =
                header_values("X-Filter", &TypeRef::Dynamic, &json!({ "a": 1 }))
        );
        check!(name == "X-Filter");
        check!(header_values("X-Filter", &TypeRef::Dynamic, &json!([{ "a": 1 }])).is_err());
    }

    #[test]
    fn render_scalars() {
        check!(render(&json!("a b")) == Some("a b".to_string()));
        check!(render(&json!(1.5)) == Some("1.5".to_string()));
        check!(render(&json!(false)) == Some("false".to_string()));
        check!(render(&Value::Null).is_none());
        check!(render(&json!({ "a": 1 })) == Some(r#"{"a":1}"#.to_string()));
        check!(render_all(&json!([1, null, 2])) == vec!["1", "2"]);
    }
}

//! Route templates and route-URL synthesis.
//!
//! The host framework owns routing; [`RouteSynthesizer`] is the seam the
//! finalize stage calls. [`TemplateRouteSynthesizer`] is the default stand-in:
//! it fills `{name}` placeholders from the url values and sends everything
//! left over as a query string, the way the framework's link generator does.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;
use url::form_urlencoded;

use crate::value::{render, render_all};
use crate::{EndpointDescriptor, Error, Result};

/// Encoding set for a single path segment: everything but unreserved and
/// sub-delimiter characters.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

// ============================================================================
// Url values
// ============================================================================

/// Route and query values collected while building a request.
///
/// Keys compare ASCII case-insensitively, like the framework's route value
/// dictionary. Inserting an existing key replaces its value in place, so the
/// last write wins and the first insertion fixes the position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlValues {
    entries: Vec<(String, Value)>,
}

impl UrlValues {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            entry.0 = key;
            return Some(std::mem::replace(&mut entry.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(key))?;
        Some(self.entries.remove(index).1)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for UrlValues {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

// ============================================================================
// Route template
// ============================================================================

/// A `{name}` placeholder of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParameter {
    name: String,
    optional: bool,
    catch_all: bool,
    default: Option<String>,
}

impl RouteParameter {
    /// Placeholder name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{name?}`
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// `{*name}`
    #[must_use]
    pub const fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    /// `{name=default}`
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    fn parse(token: &str, template: &str) -> Result<Self> {
        let catch_all = token.starts_with('*');
        let token = token.trim_start_matches('*');
        let optional = token.ends_with('?');
        let token = token.trim_end_matches('?');
        let (token, default) = match token.split_once('=') {
            Some((name, default)) => (name, Some(default.to_string())),
            None => (token, None),
        };
        let name = token.split(':').next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(Error::invalid_request(format!(
                "empty route parameter in template '{template}'"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            optional,
            catch_all,
            default,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Parameter(RouteParameter),
}

/// A parsed route template such as `/api/{controller}/{id:int}/{*rest}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Vec<Part>>,
}

impl RouteTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns an error on unbalanced braces or empty placeholder names.
    pub fn parse(template: impl Into<String>) -> Result<Self> {
        let raw = template.into();
        let mut segments = Vec::new();
        for segment in raw.trim_matches('/').split('/').filter(|s| !s.is_empty()) {
            segments.push(Self::parse_segment(segment, &raw)?);
        }
        Ok(Self { raw, segments })
    }

    fn parse_segment(segment: &str, template: &str) -> Result<Vec<Part>> {
        let unbalanced =
            || Error::invalid_request(format!("unbalanced braces in route template '{template}'"));
        let mut parts = Vec::new();
        let mut rest = segment;
        while !rest.is_empty() {
            match rest.find('{') {
                Some(0) => {
                    let end = rest.find('}').ok_or_else(unbalanced)?;
                    let token = rest.get(1..end).ok_or_else(unbalanced)?;
                    parts.push(Part::Parameter(RouteParameter::parse(token, template)?));
                    rest = rest.get(end + 1..).unwrap_or_default();
                }
                Some(start) => {
                    let literal = rest.get(..start).unwrap_or_default();
                    if literal.contains('}') {
                        return Err(unbalanced());
                    }
                    parts.push(Part::Literal(literal.to_string()));
                    rest = rest.get(start..).unwrap_or_default();
                }
                None => {
                    if rest.contains('}') {
                        return Err(unbalanced());
                    }
                    parts.push(Part::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }
        Ok(parts)
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholders, in template order.
    pub fn parameters(&self) -> impl Iterator<Item = &RouteParameter> {
        self.segments.iter().flatten().filter_map(|part| match part {
            Part::Parameter(parameter) => Some(parameter),
            Part::Literal(_) => None,
        })
    }

    /// Returns `true` if the template has a placeholder with this name.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters()
            .any(|parameter| parameter.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for RouteTemplate {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

// ============================================================================
// Synthesis
// ============================================================================

/// Produces a concrete path (and query) for an endpoint from url values.
///
/// Returning `None` means no route matches, which the finalize stage reports
/// as [`Error::RouteSynthesisFailure`].
pub trait RouteSynthesizer: Send + Sync {
    /// Synthesize the path and query string, e.g. `/users/5?page=2`.
    fn synthesize(&self, endpoint: &EndpointDescriptor, values: &UrlValues) -> Option<String>;
}

/// Default synthesizer driven by the endpoint's [`RouteTemplate`].
///
/// - placeholders take their value from the url values, then from the
///   endpoint's required route values, then from their default,
/// - a missing optional placeholder drops its segment,
/// - a missing required placeholder, or a url value contradicting a required
///   route value, fails the synthesis,
/// - remaining non-null url values become query parameters, sequences as
///   repeated keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRouteSynthesizer;

impl RouteSynthesizer for TemplateRouteSynthesizer {
    fn synthesize(&self, endpoint: &EndpointDescriptor, values: &UrlValues) -> Option<String> {
        for (key, required) in endpoint.route_values() {
            if let Some(value) = values.get(key)
                && !render(value).is_some_and(|given| given.eq_ignore_ascii_case(required))
            {
                return None;
            }
        }

        let mut consumed: Vec<&str> = Vec::new();
        let mut path = String::new();
        for segment in &endpoint.route().segments {
            let mut rendered = String::new();
            let mut dropped = false;
            for part in segment {
                match part {
                    Part::Literal(literal) => rendered.push_str(literal),
                    Part::Parameter(parameter) => {
                        let value = values.get(&parameter.name).and_then(render).or_else(|| {
                            endpoint
                                .route_value(&parameter.name)
                                .map(ToString::to_string)
                        });
                        match (value, &parameter.default) {
                            (Some(value), _) => {
                                consumed.push(parameter.name.as_str());
                                rendered.push_str(&encode_route_value(&value, parameter.catch_all));
                            }
                            (None, Some(default)) => rendered.push_str(default),
                            (None, None) if parameter.optional || parameter.catch_all => {
                                dropped = true;
                            }
                            (None, None) => return None,
                        }
                    }
                }
            }
            if !dropped {
                path.push('/');
                path.push_str(&rendered);
            }
        }
        if path.is_empty() {
            path.push('/');
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (key, value) in values.iter() {
            let is_consumed = consumed.iter().any(|name| name.eq_ignore_ascii_case(key));
            if is_consumed || endpoint.route_value(key).is_some() {
                continue;
            }
            for rendered in render_all(value) {
                query.append_pair(key, &rendered);
                has_query = true;
            }
        }
        if has_query {
            path.push('?');
            path.push_str(&query.finish());
        }
        Some(path)
    }
}

fn encode_route_value(value: &str, catch_all: bool) -> String {
    if catch_all {
        value
            .split('/')
            .map(|piece| utf8_percent_encode(piece, PATH_SEGMENT_ENCODE_SET).to_string())
            .collect::<Vec<_>>()
            .join("/")
    } else {
        utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::Method;

    fn endpoint(template: &str) -> EndpointDescriptor {
        EndpointDescriptor::builder("Test.Action", Method::Get, template)
            .route_value("controller", "Users")
            .route_value("action", "Get")
            .build()
            .expect("endpoint")
    }

    fn synthesize(template: &str, values: &[(&str, Value)]) -> Option<String> {
        let values = values.iter().cloned().collect::<UrlValues>();
        TemplateRouteSynthesizer.synthesize(&endpoint(template), &values)
    }

    #[test]
    fn url_values_last_write_wins_case_insensitively() {
        let mut values = UrlValues::new();
        check!(values.insert("Id", json!(1)).is_none());
        check!(values.insert("page", json!(2)).is_none());
        check!(values.insert("id", json!(3)) == Some(json!(1)));

        check!(values.len() == 2);
        check!(values.get("ID") == Some(&json!(3)));
        check!(values.iter().map(|(key, _)| key).collect::<Vec<_>>() == vec!["id", "page"]);
        check!(values.remove("PAGE") == Some(json!(2)));
        check!(!values.contains_key("page"));
    }

    #[test]
    fn parse_template_parameters() {
        let template =
            RouteTemplate::parse("/api/{controller}/{id:int}/v{version=1}/{slug?}/{*rest}")
                .expect("template");
        let parameters = template.parameters().collect::<Vec<_>>();

        check!(parameters.len() == 5);
        let_assert!([controller, id, version, slug, rest] = parameters.as_slice());
        check!(controller.name() == "controller");
        check!(id.name() == "id");
        check!(version.default_value() == Some("1"));
        check!(slug.is_optional());
        check!(rest.is_catch_all());
        check!(template.has_parameter("ID"));
        check!(template.to_string() == "/api/{controller}/{id:int}/v{version=1}/{slug?}/{*rest}");
    }

    #[test]
    fn parse_rejects_unbalanced_braces() {
        check!(RouteTemplate::parse("/users/{id").is_err());
        check!(RouteTemplate::parse("/users/id}").is_err());
        check!(RouteTemplate::parse("/users/{}").is_err());
    }

    #[test]
    fn synthesize_substitutes_route_values() {
        let path = synthesize("/users/{id}", &[("id", json!(5))]);
        check!(path == Some("/users/5".to_string()));
    }

    #[test]
    fn synthesize_sends_leftovers_as_query() {
        let path = synthesize("/users/{id}", &[
            ("id", json!(5)),
            ("filter.A", json!("x y")),
            ("tags", json!(["a", "b"])),
            ("skipped", Value::Null),
        ])
        .expect("path");
        insta::assert_snapshot!(path, @"/users/5?filter.A=x+y&tags=a&tags=b");
    }

    #[test]
    fn synthesize_uses_required_route_values() {
        let path = synthesize("/api/{controller}/{action}", &[("action", json!("get"))]);
        check!(path == Some("/api/Users/get".to_string()));

        // required values never leak into the query string
        let path = synthesize("/users", &[("controller", json!("users"))]);
        check!(path == Some("/users".to_string()));
    }

    #[test]
    fn synthesize_rejects_contradicting_required_value() {
        check!(synthesize("/users", &[("controller", json!("Orders"))]).is_none());
    }

    #[test]
    fn synthesize_fails_on_missing_required_segment() {
        check!(synthesize("/users/{id}", &[]).is_none());
        check!(synthesize("/users/{id}", &[("id", Value::Null)]).is_none());
    }

    #[test]
    fn synthesize_handles_optional_default_and_catch_all() {
        check!(synthesize("/users/{id?}", &[]) == Some("/users".to_string()));
        check!(synthesize("/v{version=2}/users", &[]) == Some("/v2/users".to_string()));
        check!(
            synthesize("/files/{*path}", &[("path", json!("a b/c.txt"))])
                == Some("/files/a%20b/c.txt".to_string())
        );
    }

    #[test]
    fn synthesize_encodes_segments() {
        let path = synthesize("/search/{term}", &[("term", json!("a/b?c"))]);
        check!(path == Some("/search/a%2Fb%3Fc".to_string()));
    }

    #[test]
    fn synthesize_root() {
        check!(synthesize("", &[]) == Some("/".to_string()));
    }
}

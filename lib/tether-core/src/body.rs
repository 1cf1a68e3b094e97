//! Body serialization.
//!
//! The content type is chosen while the request is built; the finalize stage
//! hands the collected body to a [`BodySerializer`] which only encodes
//! according to that choice.

use bytes::Bytes;
use serde_json::Value;

use crate::{Error, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    #[default]
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encodes a request body for a content type.
pub trait BodySerializer: Send + Sync {
    /// Serialize the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedContentType`] for content types the
    /// serializer cannot produce, or the underlying serialization error.
    fn serialize(&self, body: &Value, content_type: ContentType) -> Result<Bytes>;
}

/// Default serializer: JSON, form URL-encoded, and plain text for string
/// bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodySerializer;

impl BodySerializer for JsonBodySerializer {
    fn serialize(&self, body: &Value, content_type: ContentType) -> Result<Bytes> {
        match (content_type, body) {
            (ContentType::Json, _) => to_json(body),
            (ContentType::FormUrlEncoded, _) => to_form(body),
            (ContentType::PlainText, Value::String(text)) => Ok(Bytes::from(text.clone())),
            (other, _) => Err(Error::UnsupportedContentType(other.to_string())),
        }
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use tether_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// Sequences become repeated fields (e.g., `tags=a&tags=b`).
///
/// # Errors
///
/// Returns an error if the value is not a flat map or struct.
pub fn to_form<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

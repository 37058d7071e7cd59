//! Body and parameter serialization.
//!
//! Three wire encodings are produced from the logical parameter map:
//!
//! - JSON via [`to_json`] / decoded via [`from_json`] with path-aware
//!   error messages.
//! - Query strings via [`to_query_string`]: collection values expand to
//!   repeated `key=v1&key=v2` pairs, never a single encoded array token.
//! - Form bodies via [`to_form`]: nested values flatten with bracket
//!   notation (`parent[child]=v`, `list[0]=v`).

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
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
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Characters escaped in query string components, matching
/// `application/x-www-form-urlencoded` expectations.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Render a JSON value as a plain parameter string.
///
/// Strings are rendered without surrounding quotes; `null` renders empty.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes with path-aware error messages.
///
/// Uses `serde_path_to_error` so a failed decode names the exact field
/// (e.g., `user.address.city`).
///
/// # Errors
///
/// Returns [`crate::Error::JsonDeserialization`] if decoding fails.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Expand a parameter map into query pairs.
///
/// Collection values become one pair per element, preserving order.
#[must_use]
pub fn query_pairs(data: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in data {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), value_to_string(item)));
                }
            }
            other => pairs.push((key.clone(), value_to_string(other))),
        }
    }
    pairs
}

/// Encode a parameter map as a query string (without the leading `?`).
#[must_use]
pub fn to_query_string(data: &Map<String, Value>) -> String {
    let pairs = query_pairs(data);
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&utf8_percent_encode(&key, QUERY_SET).to_string());
        out.push('=');
        out.push_str(&utf8_percent_encode(&value, QUERY_SET).to_string());
    }
    out
}

/// Flatten a JSON value into form pairs using bracket notation.
///
/// `{"parent": {"child": 1}, "list": ["a", "b"]}` becomes
/// `[("parent[child]", "1"), ("list[0]", "a"), ("list[1]", "b")]`.
#[must_use]
pub fn flatten_pairs(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into("", value, &mut pairs);
    pairs
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}[{key}]")
                };
                flatten_into(&key, value, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}[{index}]"), item, out);
            }
        }
        other => {
            if !prefix.is_empty() {
                out.push((prefix.to_string(), value_to_string(other)));
            }
        }
    }
}

/// Serialize a JSON value to form URL-encoded bytes.
///
/// Nested objects and arrays are flattened with bracket notation first.
///
/// # Errors
///
/// Returns an error if form serialization fails.
pub fn to_form(value: &Value) -> Result<Bytes> {
    let pairs = flatten_pairs(value);
    serde_html_form::to_string(&pairs)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

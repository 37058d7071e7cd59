//! HTTP request values.
//!
//! [`Request`] is the logical per-invocation value produced by the request
//! builder: resolved URL, parameter map, headers, cookies, and an optional
//! body payload. Request hooks may mutate it before dispatch. The content
//! negotiator then encodes it into a [`WireRequest`], the finalized form a
//! transport sends (possibly several times, under retry).

use std::time::Duration;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::multipart::Form;
use crate::strmap::StrMap;
use crate::Method;

/// Request body payload.
#[derive(Debug, Clone)]
pub enum Body {
    /// A structured value, serialized according to the negotiated
    /// content type (JSON or form-encoded).
    Value(Value),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
    /// A file upload; always dispatched as a multipart form.
    File {
        /// File name reported in the multipart part.
        file_name: String,
        /// File content.
        content: Bytes,
    },
    /// A pre-built multipart form.
    Multipart(Form),
}

impl Body {
    /// Returns `true` if this body turns the request into a multipart
    /// upload.
    #[must_use]
    pub const fn is_upload(&self) -> bool {
        matches!(self, Self::File { .. } | Self::Multipart(_))
    }
}

/// A logical HTTP request, owned by a single invocation.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    timeout: Duration,
    headers: StrMap,
    cookies: StrMap,
    data: Map<String, Value>,
    body: Option<Body>,
    file_form_key: Option<String>,
}

impl Request {
    /// Create a new request for the given method and resolved URL.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            timeout,
            headers: StrMap::new(),
            cookies: StrMap::new(),
            data: Map::new(),
            body: None,
            file_form_key: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL (path variables may still be unresolved before the
    /// final template pass).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replace the URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request headers, in declaration order. Last write wins on
    /// duplicate keys.
    #[must_use]
    pub const fn headers(&self) -> &StrMap {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    /// Set a header only if not already present.
    pub fn set_header_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if !self.headers.contains_key(name) {
            self.headers.insert(name, value);
        }
    }

    /// Merge headers; existing keys are overwritten.
    pub fn merge_headers(&mut self, headers: impl IntoIterator<Item = (String, String)>) {
        self.headers.extend(headers);
    }

    /// Request cookies, in declaration order.
    #[must_use]
    pub const fn cookies(&self) -> &StrMap {
        &self.cookies
    }

    /// Set a cookie, replacing any previous value.
    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name, value);
    }

    /// Merge cookies; existing keys are overwritten.
    pub fn merge_cookies(&mut self, cookies: impl IntoIterator<Item = (String, String)>) {
        self.cookies.extend(cookies);
    }

    /// The ordered parameter map. Entries are consumed as consuming path
    /// variables are substituted.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Mutable access to the parameter map.
    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    /// Add a parameter.
    pub fn add_param(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Request body payload.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Set the body, replacing any prior payload.
    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    /// Take the body out of the request, leaving `None`.
    #[must_use]
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Returns `true` if the request carries an upload payload.
    #[must_use]
    pub fn is_upload(&self) -> bool {
        self.body.as_ref().is_some_and(Body::is_upload)
    }

    /// Form field key for a single-file upload.
    #[must_use]
    pub fn file_form_key(&self) -> Option<&str> {
        self.file_form_key.as_deref()
    }

    /// Set the form field key for a single-file upload.
    pub fn set_file_form_key(&mut self, key: impl Into<String>) {
        self.file_form_key = Some(key.into());
    }
}

/// A finalized wire request: URL with query string applied, headers with
/// cookies folded in, and an encoded byte body.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully resolved URL.
    pub url: url::Url,
    /// Final header set, including the negotiated `Content-Type`.
    pub headers: Vec<(String, String)>,
    /// Encoded body bytes, if any.
    pub body: Option<Bytes>,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_basics() {
        let mut request = Request::new(Method::Get, "/city/getById", Duration::from_secs(5));
        request.set_header("Accept", "application/json");
        request.add_param("id", json!(1));

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url(), "/city/getById");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.data().get("id"), Some(&json!(1)));
        assert!(request.body().is_none());
        assert!(!request.is_upload());
    }

    #[test]
    fn header_last_write_wins() {
        let mut request = Request::new(Method::Get, "/", Duration::from_secs(5));
        request.set_header("X-Token", "a");
        request.set_header("X-Token", "b");
        assert_eq!(request.header("X-Token"), Some("b"));
    }

    #[test]
    fn header_if_absent_does_not_override() {
        let mut request = Request::new(Method::Post, "/", Duration::from_secs(5));
        request.set_header("Content-Type", "application/xml");
        request.set_header_if_absent("Content-Type", "application/json");
        assert_eq!(request.header("Content-Type"), Some("application/xml"));
    }

    #[test]
    fn body_replaces_prior_payload() {
        let mut request = Request::new(Method::Post, "/", Duration::from_secs(5));
        request.set_body(Body::Value(json!({"a": 1})));
        request.set_body(Body::Bytes(Bytes::from_static(b"raw")));
        assert!(matches!(request.body(), Some(Body::Bytes(_))));
    }

    #[test]
    fn file_body_marks_upload() {
        let mut request = Request::new(Method::Post, "/upload", Duration::from_secs(5));
        request.set_body(Body::File {
            file_name: "photo.png".to_string(),
            content: Bytes::from_static(&[0x89, 0x50]),
        });
        request.set_file_form_key("media");
        assert!(request.is_upload());
        assert_eq!(request.file_form_key(), Some("media"));
    }

    #[test]
    fn headers_keep_declaration_order() {
        let mut request = Request::new(Method::Get, "/", Duration::from_secs(5));
        request.set_header("Z-Trace", "1");
        request.set_header("Accept", "application/json");
        request.set_header("X-Token", "t");

        let names: Vec<_> = request.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Z-Trace", "Accept", "X-Token"]);
    }

    #[test]
    fn data_map_preserves_insertion_order() {
        let mut request = Request::new(Method::Get, "/", Duration::from_secs(5));
        request.add_param("z", json!(1));
        request.add_param("a", json!(2));
        let keys: Vec<_> = request.data().keys().cloned().collect();
        assert_eq!(keys, vec!["z".to_string(), "a".to_string()]);
    }
}

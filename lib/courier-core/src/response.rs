//! HTTP response values.
//!
//! [`Response`] wraps a transport result: status, multi-valued headers,
//! cookies, and a buffered body with text/bytes/JSON accessors.

use std::collections::HashMap;

use bytes::Bytes;

/// HTTP response with status, headers, cookies, and a buffered body.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    status_message: String,
    headers: HashMap<String, Vec<String>>,
    cookies: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Creates a new response. Header names are matched
    /// case-insensitively; store them lowercase.
    #[must_use]
    pub fn new(
        status: u16,
        status_message: impl Into<String>,
        headers: HashMap<String, Vec<String>>,
        body: Bytes,
    ) -> Self {
        let cookies = parse_cookies(&headers);
        Self {
            status,
            status_message: status_message.into(),
            headers,
            cookies,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// HTTP status message (reason phrase).
    #[must_use]
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Response headers (multi-valued).
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }

    /// First header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a header (case-insensitive).
    #[must_use]
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Response cookies, parsed from `Set-Cookie` headers.
    #[must_use]
    pub const fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Content type, without charset parameters.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|value| value.split(';').next().unwrap_or(value).trim())
    }

    /// Character set, derived from the `Content-Type` header.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.header("content-type")?
            .split(';')
            .filter_map(|part| part.trim().strip_prefix("charset="))
            .next()
    }

    /// Response body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Response body as text (lossy UTF-8).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns `true` if the body is empty or blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }
}

/// Extract `name=value` pairs from `Set-Cookie` headers, dropping
/// attributes like `Path` or `Expires`.
fn parse_cookies(headers: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
    headers
        .get("set-cookie")
        .into_iter()
        .flatten()
        .filter_map(|line| {
            let pair = line.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

//! Call descriptors: the static registration table.
//!
//! Instead of intercepting arbitrary method calls, callers register one
//! [`CallDescriptor`] per remote endpoint inside an [`ApiGroup`]. The
//! descriptor carries the URL template, verb, timeout, parameter-binding
//! list, and per-method overrides (retry policy, form encoding, envelope
//! expectation). Descriptors are immutable after registration and live
//! for the process lifetime.
//!
//! # Example
//!
//! ```
//! use courier_core::{ApiGroup, CallDescriptor, Method};
//!
//! let group = ApiGroup::new("city-api")
//!     .prefix("${api.host}/city")
//!     .call(
//!         CallDescriptor::new("get_by_id", Method::Get, "/getById/{id}")
//!             .param("id"),
//!     );
//! assert!(group.find("get_by_id").is_some());
//! ```

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::envelope::EnvelopeConfig;
use crate::multipart::Form;
use crate::retry::RetryPolicy;
use crate::strmap::StrMap;
use crate::{Method, Result};

/// Default per-call timeout, matching common HTTP client defaults.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How one declared parameter is bound into the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// Bound to a named key in the parameter map.
    Named(String),
    /// The argument becomes the raw request body, replacing any prior
    /// body. Map-shaped values are also flattened into the parameter map
    /// for path-variable substitution.
    Body,
    /// A string map merged into the request headers.
    Headers,
    /// A string map merged into the request cookies.
    Cookies,
    /// A file/stream argument; the string is the multipart form key.
    File(String),
}

/// Envelope handling for a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EnvelopeMode {
    /// Use the API group's envelope configuration.
    #[default]
    Inherit,
    /// The declared result type is itself the envelope shape: deserialize
    /// the whole body, never unwrap.
    Disabled,
    /// Unwrap with this configuration.
    Expect(EnvelopeConfig),
}

/// Static metadata describing one remote endpoint.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    name: String,
    method: Method,
    url: String,
    timeout: Duration,
    bindings: Vec<ParamBinding>,
    retry: Option<RetryPolicy>,
    form: bool,
    headers: StrMap,
    cookies: StrMap,
    envelope: EnvelopeMode,
}

impl CallDescriptor {
    /// Create a descriptor for the given logical name, verb, and URL
    /// template.
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            bindings: Vec::new(),
            retry: None,
            form: false,
            headers: StrMap::new(),
            cookies: StrMap::new(),
            envelope: EnvelopeMode::default(),
        }
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Declare a parameter bound to a named key.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>) -> Self {
        self.bindings.push(ParamBinding::Named(key.into()));
        self
    }

    /// Declare a parameter bound as the raw request body.
    #[must_use]
    pub fn body_param(mut self) -> Self {
        self.bindings.push(ParamBinding::Body);
        self
    }

    /// Declare a headers-map parameter.
    #[must_use]
    pub fn headers_param(mut self) -> Self {
        self.bindings.push(ParamBinding::Headers);
        self
    }

    /// Declare a cookies-map parameter.
    #[must_use]
    pub fn cookies_param(mut self) -> Self {
        self.bindings.push(ParamBinding::Cookies);
        self
    }

    /// Declare a file parameter with its multipart form key.
    #[must_use]
    pub fn file_param(mut self, form_key: impl Into<String>) -> Self {
        self.bindings.push(ParamBinding::File(form_key.into()));
        self
    }

    /// Set a method-level retry policy, overriding the group default.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Encode the body as `application/x-www-form-urlencoded`.
    #[must_use]
    pub const fn form(mut self) -> Self {
        self.form = true;
        self
    }

    /// Attach a static header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a static cookie.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name, value);
        self
    }

    /// Expect a specific envelope code for this call.
    #[must_use]
    pub fn expect(mut self, config: EnvelopeConfig) -> Self {
        self.envelope = EnvelopeMode::Expect(config);
        self
    }

    /// The declared result type is itself the envelope shape; never
    /// unwrap.
    #[must_use]
    pub fn no_envelope(mut self) -> Self {
        self.envelope = EnvelopeMode::Disabled;
        self
    }

    /// Logical call name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// URL template.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.timeout
    }

    /// Declared parameter bindings, in argument order.
    #[must_use]
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// Method-level retry policy, if declared.
    #[must_use]
    pub const fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Returns `true` if the body is form-encoded.
    #[must_use]
    pub const fn is_form(&self) -> bool {
        self.form
    }

    /// Static method-level headers, in declaration order.
    #[must_use]
    pub const fn static_headers(&self) -> &StrMap {
        &self.headers
    }

    /// Static method-level cookies, in declaration order.
    #[must_use]
    pub const fn static_cookies(&self) -> &StrMap {
        &self.cookies
    }

    /// Envelope handling declared on this call.
    #[must_use]
    pub const fn envelope(&self) -> &EnvelopeMode {
        &self.envelope
    }
}

/// A group of calls sharing a URL prefix and defaults, the equivalent of
/// one declared API interface.
#[derive(Debug, Clone, Default)]
pub struct ApiGroup {
    name: String,
    prefix: Option<String>,
    headers: StrMap,
    cookies: StrMap,
    retry: Option<RetryPolicy>,
    form: bool,
    envelope: Option<EnvelopeConfig>,
    calls: Vec<CallDescriptor>,
}

impl ApiGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the URL prefix applied to non-absolute templates. The prefix
    /// may itself contain `${}` placeholders.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attach a static header to every call in the group. Method-level
    /// headers win on key collision.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a static cookie to every call in the group.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name, value);
        self
    }

    /// Set a group-level retry policy default.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Form-encode bodies for every call in the group.
    #[must_use]
    pub const fn form(mut self) -> Self {
        self.form = true;
        self
    }

    /// Set the group's envelope expectation.
    #[must_use]
    pub fn expect(mut self, config: EnvelopeConfig) -> Self {
        self.envelope = Some(config);
        self
    }

    /// Register a call.
    #[must_use]
    pub fn call(mut self, descriptor: CallDescriptor) -> Self {
        self.calls.push(descriptor);
        self
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL prefix, if set.
    #[must_use]
    pub fn url_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Group-level static headers, in declaration order.
    #[must_use]
    pub const fn static_headers(&self) -> &StrMap {
        &self.headers
    }

    /// Group-level static cookies, in declaration order.
    #[must_use]
    pub const fn static_cookies(&self) -> &StrMap {
        &self.cookies
    }

    /// Group-level retry policy default.
    #[must_use]
    pub const fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Returns `true` if the group form-encodes bodies by default.
    #[must_use]
    pub const fn is_form(&self) -> bool {
        self.form
    }

    /// Group-level envelope configuration, defaulting to the standard
    /// `{code, message, data}` convention when unset.
    #[must_use]
    pub fn envelope(&self) -> EnvelopeConfig {
        self.envelope.clone().unwrap_or_default()
    }

    /// All registered calls.
    #[must_use]
    pub fn calls(&self) -> &[CallDescriptor] {
        &self.calls
    }

    /// Look up a call by logical name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CallDescriptor> {
        self.calls.iter().find(|c| c.name() == name)
    }
}

/// One bound argument value for an invocation.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// A structured value (scalar, object, or collection).
    Value(Value),
    /// Raw bytes used as the request body.
    Bytes(Bytes),
    /// A file payload for multipart upload.
    File {
        /// File name reported in the multipart part.
        file_name: String,
        /// File content.
        content: Bytes,
    },
    /// A pre-built multipart form.
    Multipart(Form),
    /// A string map, for headers/cookies bindings.
    StrMap(HashMap<String, String>),
}

/// The ordered argument list for one invocation, matching the
/// descriptor's binding list positionally.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<ArgValue>);

impl Args {
    /// Create an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a structured value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.0.push(ArgValue::Value(value.into()));
        self
    }

    /// Append any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn serialized<T: serde::Serialize>(mut self, value: &T) -> Result<Self> {
        self.0.push(ArgValue::Value(serde_json::to_value(value)?));
        Ok(self)
    }

    /// Append raw body bytes.
    #[must_use]
    pub fn bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.0.push(ArgValue::Bytes(bytes.into()));
        self
    }

    /// Append a file payload.
    #[must_use]
    pub fn file(mut self, file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.0.push(ArgValue::File {
            file_name: file_name.into(),
            content: content.into(),
        });
        self
    }

    /// Append a pre-built multipart form.
    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.0.push(ArgValue::Multipart(form));
        self
    }

    /// Append a string map (for headers/cookies bindings).
    #[must_use]
    pub fn str_map(mut self, map: HashMap<String, String>) -> Self {
        self.0.push(ArgValue::StrMap(map));
        self
    }

    /// Returns `true` if no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The argument values, in order.
    #[must_use]
    pub fn values(&self) -> &[ArgValue] {
        &self.0
    }

    /// Consume into the argument values.
    #[must_use]
    pub fn into_values(self) -> Vec<ArgValue> {
        self.0
    }
}

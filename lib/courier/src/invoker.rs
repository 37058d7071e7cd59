//! The invocation pipeline.
//!
//! [`Invoker`] turns one registered call into an HTTP exchange:
//!
//! 1. look up the [`CallDescriptor`] and resolve `${}` configuration
//!    placeholders (prepending the group prefix for relative templates)
//! 2. bind arguments into a logical [`Request`](courier_core::Request)
//! 3. run a lenient path-variable pass, then the request hooks, then the
//!    final strict pass (hooks may supply missing variables)
//! 4. encode, dispatch under the resolved retry policy, run response
//!    hooks
//! 5. raise non-2xx as [`Error::Http`], unwrap the envelope, and
//!    deserialize
//!
//! [`Factory`] caches one invoker per group name so call sites can share
//! the transport, resolver chain, and hooks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use courier_core::{
    envelope, template, ApiGroup, Args, CallDescriptor, ContentType, EnvelopeMode, Error, Response,
    Result,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    builder, client::HyperTransport, encode, hooks::RequestHook, hooks::ResponseHook,
    retry::send_with_retry, transport::Transport,
};

use courier_core::ResolverChain;

/// Executes registered calls for one [`ApiGroup`].
pub struct Invoker<T = HyperTransport> {
    group: ApiGroup,
    transport: Arc<T>,
    resolver: Arc<ResolverChain>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
}

impl<T> std::fmt::Debug for Invoker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("group", &self.group.name())
            .field("request_hooks", &self.request_hooks.len())
            .field("response_hooks", &self.response_hooks.len())
            .finish_non_exhaustive()
    }
}

impl Invoker<HyperTransport> {
    /// Create an invoker for the group with a default HTTPS transport.
    #[must_use]
    pub fn new(group: ApiGroup) -> Self {
        Self::with_transport(group, HyperTransport::new())
    }
}

impl<T: Transport> Invoker<T> {
    /// Create an invoker with a custom transport.
    #[must_use]
    pub fn with_transport(group: ApiGroup, transport: T) -> Self {
        Self {
            group,
            transport: Arc::new(transport),
            resolver: Arc::new(ResolverChain::new()),
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
        }
    }

    /// Replace the property resolver chain.
    #[must_use]
    pub fn resolver(mut self, resolver: ResolverChain) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Append a request hook. Hooks run in registration order.
    #[must_use]
    pub fn request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request_hooks.push(Arc::new(hook));
        self
    }

    /// Append a response hook. Hooks run in registration order.
    #[must_use]
    pub fn response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_hooks.push(Arc::new(hook));
        self
    }

    /// The group served by this invoker.
    #[must_use]
    pub const fn group(&self) -> &ApiGroup {
        &self.group
    }

    /// Invoke a call and deserialize its (possibly envelope-wrapped)
    /// result.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown calls, unresolved template
    /// variables, transport failures after retries, non-2xx statuses,
    /// envelope code mismatches, and decode failures.
    pub async fn invoke<R: DeserializeOwned>(&self, name: &str, args: Args) -> Result<R> {
        let (descriptor, response) = self.dispatch(name, args).await?;

        if !response.is_success() {
            return Err(Error::http_with_body(
                response.status(),
                response.status_message(),
                response.body().clone(),
            ));
        }

        let config = match descriptor.envelope() {
            EnvelopeMode::Inherit => Some(self.group.envelope()),
            EnvelopeMode::Disabled => None,
            EnvelopeMode::Expect(config) => Some(config.clone()),
        };

        match config {
            Some(config) => {
                let call = format!("{}.{name}", self.group.name());
                let value = envelope::unwrap(&call, &config, response.body())?;
                deserialize_value(value)
            }
            // a blank body decodes as null, matching the envelope path
            None if response.is_blank() => deserialize_value(Value::Null),
            None => response.json(),
        }
    }

    /// Invoke a call and return the raw response, without status checks
    /// or envelope unwrapping.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown calls, unresolved template
    /// variables, and transport failures after retries.
    pub async fn invoke_raw(&self, name: &str, args: Args) -> Result<Response> {
        let (_, response) = self.dispatch(name, args).await?;
        Ok(response)
    }

    async fn dispatch(&self, name: &str, args: Args) -> Result<(&CallDescriptor, Response)> {
        let descriptor = self.group.find(name).ok_or_else(|| {
            Error::configuration(format!(
                "no call named `{name}` registered in group `{}`",
                self.group.name()
            ))
        })?;
        let call = format!("{}.{name}", self.group.name());

        let url = self.resolve_url(descriptor)?;
        let mut request = builder::build_request(&self.group, descriptor, url, args)?;

        if descriptor.is_form() || self.group.is_form() {
            request.set_header_if_absent("Content-Type", ContentType::FormUrlEncoded.as_str());
        }

        // lenient pass: hooks may still add missing path variables
        let url = request.url().to_string();
        let url = template::fill_path_vars(&url, request.data_mut(), false)?;
        request.set_url(url);

        for hook in &self.request_hooks {
            hook.before_send(descriptor, &mut request)?;
        }

        let url = request.url().to_string();
        let url = template::fill_path_vars(&url, request.data_mut(), true)?;
        request.set_url(url);

        let policy = descriptor
            .retry_policy()
            .or_else(|| self.group.retry_policy());
        let wire = encode::encode(request)?;
        tracing::debug!(call, method = %wire.method, url = %wire.url, "dispatching");

        let started = std::time::Instant::now();
        let mut response = send_with_retry(self.transport.as_ref(), &call, policy, &wire).await?;
        tracing::debug!(
            call,
            status = response.status(),
            elapsed = ?started.elapsed(),
            "received"
        );

        for hook in &self.response_hooks {
            response = hook.after_receive(descriptor, response)?;
        }

        Ok((descriptor, response))
    }

    /// Resolve `${}` placeholders and prepend the group prefix for
    /// relative templates.
    fn resolve_url(&self, descriptor: &CallDescriptor) -> Result<String> {
        let url = template::fill_config_vars(descriptor.url(), self.resolver.as_ref())?;
        if template::is_absolute_url(&url) {
            return Ok(url);
        }

        let prefix = self.group.url_prefix().ok_or_else(|| {
            Error::configuration(format!(
                "call `{}` has a relative URL and group `{}` declares no prefix",
                descriptor.name(),
                self.group.name()
            ))
        })?;
        let prefix = template::fill_config_vars(prefix, self.resolver.as_ref())?;
        Ok(join_url(&prefix, &url))
    }
}

fn join_url(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

fn deserialize_value<R: DeserializeOwned>(value: Value) -> Result<R> {
    serde_json::from_value(value)
        .map_err(|e| Error::json_deserialization(String::new(), e.to_string()))
}

/// Shares a transport, resolver chain, and hooks across invokers, and
/// caches one invoker per group name.
pub struct Factory<T = HyperTransport> {
    transport: Arc<T>,
    resolver: Arc<ResolverChain>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
    cache: Mutex<HashMap<String, Arc<Invoker<T>>>>,
}

impl<T> std::fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Factory")
            .field("cached_invokers", &cached)
            .finish_non_exhaustive()
    }
}

impl Factory<HyperTransport> {
    /// Create a factory with a default HTTPS transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(HyperTransport::new())
    }
}

impl Default for Factory<HyperTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Factory<T> {
    /// Create a factory with a custom transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            resolver: Arc::new(ResolverChain::new()),
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the property resolver chain used by new invokers.
    #[must_use]
    pub fn resolver(mut self, resolver: ResolverChain) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Append a request hook applied by new invokers.
    #[must_use]
    pub fn request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request_hooks.push(Arc::new(hook));
        self
    }

    /// Append a response hook applied by new invokers.
    #[must_use]
    pub fn response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_hooks.push(Arc::new(hook));
        self
    }

    /// Get the cached invoker for the group, building it on first use.
    /// Groups are keyed by name.
    #[must_use]
    pub fn invoker(&self, group: &ApiGroup) -> Arc<Invoker<T>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            cache
                .entry(group.name().to_string())
                .or_insert_with(|| {
                    Arc::new(Invoker {
                        group: group.clone(),
                        transport: Arc::clone(&self.transport),
                        resolver: Arc::clone(&self.resolver),
                        request_hooks: self.request_hooks.clone(),
                        response_hooks: self.response_hooks.clone(),
                    })
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use courier_core::Method;

    use super::*;

    fn group() -> ApiGroup {
        ApiGroup::new("city-api")
            .prefix("http://api.test/city")
            .call(CallDescriptor::new("get", Method::Get, "/get/{id}"))
    }

    #[test]
    fn factory_caches_by_group_name() {
        let factory = Factory::new();
        let first = factory.invoker(&group());
        let second = factory.invoker(&group());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/api/", "/x"), "http://h/api/x");
        assert_eq!(join_url("http://h/api", "x"), "http://h/api/x");
        assert_eq!(join_url("http://h/api", "/x"), "http://h/api/x");
    }
}

//! Property sources for `${key}` placeholder resolution.
//!
//! A [`ResolverChain`] holds an ordered list of sources; the first source
//! that contains a key wins. Resolution happens when a URL template is
//! filled, not when a call is registered, so a changed source (e.g. the
//! process environment) is reflected on the next invocation.

use std::collections::HashMap;

/// A single key/value property source.
pub trait PropertyResolver: Send + Sync {
    /// Returns `true` if this source contains the key.
    fn contains_property(&self, key: &str) -> bool;

    /// Get the value for a key, if present.
    fn get_property(&self, key: &str) -> Option<String>;
}

/// Property source backed by a static map.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    properties: HashMap<String, String>,
}

impl StaticResolver {
    /// Create a resolver from the given properties.
    #[must_use]
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }

    /// Add a property, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl PropertyResolver for StaticResolver {
    fn contains_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

/// Property source backed by process environment variables.
///
/// Looked up live on every call, so environment changes are visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvResolver;

impl PropertyResolver for EnvResolver {
    fn contains_property(&self, key: &str) -> bool {
        std::env::var(key).is_ok()
    }

    fn get_property(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An ordered chain of property sources.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn PropertyResolver>>,
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("sources", &self.resolvers.len())
            .finish()
    }
}

impl ResolverChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the chain. Earlier sources win on conflicts.
    pub fn push(&mut self, resolver: impl PropertyResolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    /// Builder-style variant of [`ResolverChain::push`].
    #[must_use]
    pub fn with(mut self, resolver: impl PropertyResolver + 'static) -> Self {
        self.push(resolver);
        self
    }
}

impl PropertyResolver for ResolverChain {
    fn contains_property(&self, key: &str) -> bool {
        self.resolvers.iter().any(|r| r.contains_property(key))
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.resolvers
            .iter()
            .find(|r| r.contains_property(key))
            .and_then(|r| r.get_property(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_resolver() {
        let resolver = StaticResolver::default().with("api.host", "example.com");
        assert!(resolver.contains_property("api.host"));
        assert_eq!(
            resolver.get_property("api.host"),
            Some("example.com".to_string())
        );
        assert!(!resolver.contains_property("missing"));
        assert_eq!(resolver.get_property("missing"), None);
    }

    #[test]
    fn env_resolver() {
        // PATH is set on every platform we care about
        let resolver = EnvResolver;
        assert!(resolver.contains_property("PATH"));
        assert!(resolver.get_property("PATH").is_some());
        assert!(!resolver.contains_property("COURIER_DEFINITELY_NOT_SET"));
    }

    #[test]
    fn chain_first_source_wins() {
        let chain = ResolverChain::new()
            .with(StaticResolver::default().with("key", "first"))
            .with(StaticResolver::default().with("key", "second"));

        assert_eq!(chain.get_property("key"), Some("first".to_string()));
    }

    #[test]
    fn chain_falls_through_to_later_sources() {
        let chain = ResolverChain::new()
            .with(StaticResolver::default().with("a", "1"))
            .with(StaticResolver::default().with("b", "2"));

        assert_eq!(chain.get_property("b"), Some("2".to_string()));
        assert!(chain.contains_property("a"));
        assert!(!chain.contains_property("c"));
    }

    #[test]
    fn chain_reflects_source_changes() {
        // no caching: a fresh lookup sees the current value
        let chain = ResolverChain::new().with(EnvResolver);
        assert!(!chain.contains_property("COURIER_TEST_LIVE_KEY_XYZ"));
    }
}

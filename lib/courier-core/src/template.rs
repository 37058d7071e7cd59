//! URL template resolution.
//!
//! Templates are filled in two passes:
//!
//! 1. `${key}` / `${key:default}` configuration placeholders, resolved
//!    against a [`PropertyResolver`]. A missing key with no default is a
//!    fatal configuration error, raised before any network attempt.
//! 2. Path variables bound to call arguments: `{name}` / `{name:default}`
//!    is *consuming* (the value is removed from the parameter map once
//!    substituted), `#{name}` / `#{name:default}` is *non-consuming* (the
//!    value is also retained for query/body encoding).
//!
//! Path filling runs once before request hooks (missing variables are
//! logged and skipped, so a hook may still supply them) and once after
//! (missing variables are fatal).

use serde_json::{Map, Value};
use tracing::warn;

use crate::body::value_to_string;
use crate::properties::PropertyResolver;
use crate::{Error, Result};

/// Returns `true` if the URL already carries a `scheme://` prefix.
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    match url.find("://") {
        Some(pos) if pos > 0 => url
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Split a `name` or `name:default` variable body into its parts.
fn split_default(inner: &str) -> (&str, Option<&str>) {
    match inner.split_once(':') {
        Some((name, default)) => (name, Some(default)),
        None => (inner, None),
    }
}

/// Locate the next variable of the form `<prefix>...}` whose body spans no
/// path separator. Returns (start, end-exclusive, body).
fn find_var<'a>(url: &'a str, from: usize, prefix: &str) -> Option<(usize, usize, &'a str)> {
    let mut search = from;
    while let Some(rel) = url.get(search..)?.find(prefix) {
        let start = search + rel;
        let body_start = start + prefix.len();
        match url.get(body_start..)?.find('}') {
            Some(close) => {
                let body = url.get(body_start..body_start + close)?;
                if body.is_empty() || body.contains('/') || body.contains('{') {
                    search = body_start;
                    continue;
                }
                return Some((start, body_start + close + 1, body));
            }
            None => return None,
        }
    }
    None
}

/// Fill `${key}` configuration placeholders from the resolver chain.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for a missing key with no default.
pub fn fill_config_vars(url: &str, resolver: &dyn PropertyResolver) -> Result<String> {
    let mut url = url.to_string();
    let mut from = 0;
    while let Some((start, end, body)) = find_var(&url, from, "${") {
        let (key, default) = split_default(body);
        let value = match resolver.get_property(key) {
            Some(value) => value,
            None => match default {
                Some(default) => default.to_string(),
                None => {
                    return Err(Error::configuration(format!(
                        "the url [{url}] needs a variable: [{key}], but not provided"
                    )));
                }
            },
        };
        url.replace_range(start..end, &value);
        from = start + value.len();
    }
    Ok(url)
}

/// Fill `{name}` (consuming) and `#{name}` (non-consuming) path variables
/// from the parameter map.
///
/// Consuming substitution removes the entry from `data` so it does not
/// leak into the query string or body; non-consuming substitution keeps
/// it. When `fatal` is `false`, unresolved variables are logged and left
/// in place for a later pass.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for an unresolved variable when
/// `fatal` is `true`.
pub fn fill_path_vars(url: &str, data: &mut Map<String, Value>, fatal: bool) -> Result<String> {
    let url = fill_path_pass(url, data, fatal, false)?;
    fill_path_pass(&url, data, fatal, true)
}

fn fill_path_pass(
    url: &str,
    data: &mut Map<String, Value>,
    fatal: bool,
    consume: bool,
) -> Result<String> {
    let prefix = if consume { "{" } else { "#{" };
    let mut url = url.to_string();
    let mut from = 0;
    while let Some((start, end, body)) = find_var(&url, from, prefix) {
        // the consuming pass runs second and must leave `#{...}` alone
        if consume && start > 0 && url.as_bytes().get(start - 1) == Some(&b'#') {
            from = end;
            continue;
        }
        let (key, default) = split_default(body);
        let present = data.get(key).is_some_and(|v| !v.is_null());
        let value = if present {
            let value = if consume {
                // shift_remove keeps the remaining parameters in order
                data.shift_remove(key).unwrap_or(Value::Null)
            } else {
                data.get(key).cloned().unwrap_or(Value::Null)
            };
            value_to_string(&value)
        } else if let Some(default) = default {
            default.to_string()
        } else {
            let msg =
                format!("the url [{url}] needs a variable: [{key}], but not provided");
            if fatal {
                return Err(Error::configuration(msg));
            }
            warn!("{msg}");
            from = end;
            continue;
        };
        url.replace_range(start..end, &value);
        from = start + value.len();
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::properties::StaticResolver;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test data must be an object"),
        }
    }

    #[test]
    fn absolute_url_detection() {
        assert!(is_absolute_url("https://example.com/api"));
        assert!(is_absolute_url("http://example.com"));
        assert!(is_absolute_url("ws://example.com"));
        assert!(!is_absolute_url("/city/getById"));
        assert!(!is_absolute_url("city/getById"));
        assert!(!is_absolute_url("://missing-scheme"));
    }

    #[test]
    fn config_vars_resolved() {
        let resolver = StaticResolver::default().with("api.host", "http://example.com");
        let url = fill_config_vars("${api.host}/city/getById", &resolver).expect("resolved");
        assert_eq!(url, "http://example.com/city/getById");
    }

    #[test]
    fn config_vars_resolution_is_idempotent() {
        let resolver = StaticResolver::default().with("host", "example.com");
        let once = fill_config_vars("https://${host}/api", &resolver).expect("resolved");
        let twice = fill_config_vars(&once, &resolver).expect("resolved");
        assert_eq!(once, twice);
    }

    #[test]
    fn config_vars_default_fallback() {
        let resolver = StaticResolver::default();
        let url = fill_config_vars("${scheme:https}://example.com", &resolver).expect("resolved");
        assert_eq!(url, "https://example.com");
    }

    #[test]
    fn config_vars_missing_is_fatal() {
        let resolver = StaticResolver::default();
        let err = fill_config_vars("${api.host}/api", &resolver).expect_err("missing");
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("api.host"));
    }

    #[test]
    fn consuming_path_var_removes_from_data() {
        let mut params = data(json!({"id": 42, "name": "X"}));
        let url = fill_path_vars("/city/{id}", &mut params, true).expect("filled");
        assert_eq!(url, "/city/42");
        assert!(!params.contains_key("id"));
        assert!(params.contains_key("name"));
    }

    #[test]
    fn non_consuming_path_var_keeps_data() {
        let mut params = data(json!({"id": 42}));
        let url = fill_path_vars("/city/#{id}", &mut params, true).expect("filled");
        assert_eq!(url, "/city/42");
        assert_eq!(params.get("id"), Some(&json!(42)));
    }

    #[test]
    fn path_var_default_fallback() {
        let mut params = data(json!({}));
        let url = fill_path_vars("/city/{id:1}/detail/#{lang:en}", &mut params, true)
            .expect("filled");
        assert_eq!(url, "/city/1/detail/en");
    }

    #[test]
    fn missing_path_var_is_fatal_on_final_pass() {
        let mut params = data(json!({}));
        let err = fill_path_vars("/city/{id}", &mut params, true).expect_err("missing");
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("[id]"));
    }

    #[test]
    fn missing_path_var_skipped_on_first_pass() {
        let mut params = data(json!({}));
        let url = fill_path_vars("/city/{id}", &mut params, false).expect("kept");
        assert_eq!(url, "/city/{id}");
    }

    #[test]
    fn null_value_counts_as_missing() {
        let mut params = data(json!({"id": null}));
        let err = fill_path_vars("/city/{id}", &mut params, true).expect_err("null");
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn string_values_substitute_without_quotes() {
        let mut params = data(json!({"name": "beijing"}));
        let url = fill_path_vars("/city/getByName/{name}", &mut params, true).expect("filled");
        assert_eq!(url, "/city/getByName/beijing");
    }
}

//! Envelope unwrapping for `{code, message, data}` style responses.
//!
//! Many services wrap every payload in a status envelope. When a call's
//! envelope handling is active, the response body is checked structurally:
//! a JSON object carrying a code field plus a message (`message`/`msg`) or
//! `data` field is treated as an envelope. A matching code yields the
//! `data` field; a mismatch raises [`Error::UnexpectedResult`]. Bodies
//! that are not envelope-shaped pass through untouched.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Configuration for envelope detection and unwrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeConfig {
    /// Name of the status code field.
    pub code_field: String,
    /// Code value that marks a successful call.
    pub expected_code: i64,
    /// Also match field names with the first letter's case flipped
    /// (`Code` for `code`).
    pub ignore_initial_case: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            code_field: "code".to_string(),
            expected_code: 0,
            ignore_initial_case: true,
        }
    }
}

impl EnvelopeConfig {
    /// Expect the given success code, with defaults for everything else.
    #[must_use]
    pub fn expected_code(code: i64) -> Self {
        Self {
            expected_code: code,
            ..Self::default()
        }
    }

    /// Use a custom code field name.
    #[must_use]
    pub fn code_field(mut self, field: impl Into<String>) -> Self {
        self.code_field = field.into();
        self
    }

    /// Require exact field-name casing.
    #[must_use]
    pub const fn exact_case(mut self) -> Self {
        self.ignore_initial_case = false;
        self
    }
}

/// Unwrap a decoded response value.
///
/// Returns the envelope's `data` field when the body is envelope-shaped
/// and its code matches, `Value::Null` when the body is blank, and the
/// body itself otherwise. `call` names the invocation for error messages.
///
/// # Errors
///
/// Returns [`Error::UnexpectedResult`] when the body is envelope-shaped
/// but carries a non-matching code.
pub fn unwrap(call: &str, config: &EnvelopeConfig, body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    let value: Value = crate::from_json(body)?;
    let Value::Object(map) = &value else {
        return Ok(value);
    };
    if !is_envelope(map, config) {
        return Ok(value);
    }

    let code = lookup(map, &config.code_field, config.ignore_initial_case)
        .and_then(as_code)
        .unwrap_or(i64::MIN);
    if code == config.expected_code {
        let data = lookup(map, "data", config.ignore_initial_case)
            .cloned()
            .unwrap_or(Value::Null);
        return Ok(data);
    }

    let message = message_text(map, config).unwrap_or_default();
    Err(Error::unexpected_result(
        call,
        format!(
            "expected code {} but got {code}: {message}",
            config.expected_code
        ),
    ))
}

/// Structural envelope check: a code field plus a message or data field.
fn is_envelope(map: &Map<String, Value>, config: &EnvelopeConfig) -> bool {
    let fuzzy = config.ignore_initial_case;
    let has_code = lookup(map, &config.code_field, fuzzy).is_some_and(|v| as_code(v).is_some());
    let has_companion = lookup(map, "message", fuzzy).is_some()
        || lookup(map, "msg", fuzzy).is_some()
        || lookup(map, "data", fuzzy).is_some();
    has_code && has_companion
}

fn message_text(map: &Map<String, Value>, config: &EnvelopeConfig) -> Option<String> {
    let fuzzy = config.ignore_initial_case;
    lookup(map, "message", fuzzy)
        .or_else(|| lookup(map, "msg", fuzzy))
        .map(crate::value_to_string)
}

/// Find a field by name, optionally also matching the name with its
/// first letter's case flipped.
fn lookup<'a>(map: &'a Map<String, Value>, field: &str, fuzzy: bool) -> Option<&'a Value> {
    if let Some(value) = map.get(field) {
        return Some(value);
    }
    if !fuzzy {
        return None;
    }
    let mut chars = field.chars();
    let first = chars.next()?;
    let flipped = if first.is_ascii_lowercase() {
        first.to_ascii_uppercase()
    } else {
        first.to_ascii_lowercase()
    };
    let alternate: String = std::iter::once(flipped).chain(chars).collect();
    map.get(&alternate)
}

/// Interpret a JSON value as an envelope code: integers directly, strings
/// when they parse as integers.
fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matching_code_yields_data() {
        let body = br#"{"code":0,"message":"ok","data":{"id":1}}"#;
        let value = unwrap("city.get", &EnvelopeConfig::default(), body).expect("unwrap");
        assert_eq!(value, json!({"id": 1}));
    }

    #[test]
    fn mismatched_code_raises() {
        let body = br#"{"code":403,"message":"denied","data":null}"#;
        let error = unwrap("city.get", &EnvelopeConfig::default(), body).expect_err("mismatch");
        match error {
            Error::UnexpectedResult { call, message } => {
                assert_eq!(call, "city.get");
                assert!(message.contains("403"));
                assert!(message.contains("denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn msg_field_is_recognized() {
        let body = br#"{"code":1,"msg":"bad request"}"#;
        let error = unwrap("city.get", &EnvelopeConfig::default(), body).expect_err("mismatch");
        assert!(error.to_string().contains("bad request"));
    }

    #[test]
    fn non_envelope_passes_through() {
        let body = br#"{"id":1,"name":"beijing"}"#;
        let value = unwrap("city.get", &EnvelopeConfig::default(), body).expect("pass through");
        assert_eq!(value, json!({"id": 1, "name": "beijing"}));
    }

    #[test]
    fn array_body_passes_through() {
        let body = br"[1,2,3]";
        let value = unwrap("city.list", &EnvelopeConfig::default(), body).expect("pass through");
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn blank_body_is_null() {
        let value = unwrap("city.get", &EnvelopeConfig::default(), b"  \n").expect("blank");
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn initial_case_is_ignored_by_default() {
        let body = br#"{"Code":0,"Message":"ok","Data":[1]}"#;
        let value = unwrap("city.get", &EnvelopeConfig::default(), body).expect("unwrap");
        assert_eq!(value, json!([1]));
    }

    #[test]
    fn exact_case_disables_fuzzy_lookup() {
        let config = EnvelopeConfig::default().exact_case();
        let body = br#"{"Code":0,"Message":"ok","Data":[1]}"#;
        let value = unwrap("city.get", &config, body).expect("pass through");
        assert_eq!(value, json!({"Code": 0, "Message": "ok", "Data": [1]}));
    }

    #[test]
    fn custom_expected_code() {
        let config = EnvelopeConfig::expected_code(200);
        let body = br#"{"code":200,"data":"payload"}"#;
        let value = unwrap("city.get", &config, body).expect("unwrap");
        assert_eq!(value, json!("payload"));
    }

    #[test]
    fn string_code_parses() {
        let body = br#"{"code":"0","data":true}"#;
        let value = unwrap("city.get", &EnvelopeConfig::default(), body).expect("unwrap");
        assert_eq!(value, json!(true));
    }

    #[test]
    fn missing_data_on_success_is_null() {
        let body = br#"{"code":0,"message":"ok"}"#;
        let value = unwrap("city.delete", &EnvelopeConfig::default(), body).expect("unwrap");
        assert_eq!(value, Value::Null);
    }
}

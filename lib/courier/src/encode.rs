//! Content negotiation: encodes a logical request into a wire request.
//!
//! The encoding is chosen from the request shape, in order: multipart for
//! uploads, then the body-bearing encodings (raw bytes, form, JSON), and
//! a query-string-only rendition for bodyless verbs. `Content-Type` is
//! only filled in when the caller has not set one, except for multipart
//! where the boundary forces the header.

use courier_core::{
    to_form, to_json, to_query_string, value_to_string, Body, ContentType, Error, Form, Method,
    Request, Result, WireRequest,
};
use serde_json::Value;

/// Parameter-map key naming the multipart form field for a file payload.
const FORM_KEY_PARAM: &str = "formKey";
/// Parameter-map key overriding the reported file name.
const FILE_NAME_PARAM: &str = "fileName";
/// Form field used when no key is declared or supplied.
const DEFAULT_FORM_KEY: &str = "media";

/// Encode a fully templated request into its wire form.
pub(crate) fn encode(mut request: Request) -> Result<WireRequest> {
    let method = request.method();
    let timeout = request.timeout();
    let body = request.take_body();

    fold_cookies(&mut request);

    let mut url = request.url().to_string();
    let wire_body = match body {
        Some(body @ (Body::File { .. } | Body::Multipart(_))) => {
            if method != Method::Post {
                return Err(Error::invalid_request(format!(
                    "multipart uploads require POST, got {method}"
                )));
            }
            Some(encode_multipart(&mut request, body))
        }
        Some(Body::Bytes(bytes)) if method.has_body() => {
            request.set_header_if_absent("Content-Type", ContentType::OctetStream.as_str());
            append_query(&mut url, &to_query_string(request.data()));
            Some(bytes)
        }
        Some(Body::Value(value)) if method.has_body() => {
            // body fields are mirrored into the parameter map for path
            // substitution; the leftovers must not also hit the query
            if let Value::Object(map) = &value {
                for (key, field) in map {
                    if request.data().get(key) == Some(field) {
                        let _ = request.data_mut().shift_remove(key);
                    }
                }
            }
            append_query(&mut url, &to_query_string(request.data()));
            Some(encode_value(&mut request, &value)?)
        }
        None if method.has_body() && !request.data().is_empty() => {
            let value = Value::Object(request.data().clone());
            Some(encode_value(&mut request, &value)?)
        }
        other => {
            // bodyless verbs carry everything in the query string
            if other.is_some() {
                tracing::debug!(%method, "dropping body on bodyless method");
            }
            append_query(&mut url, &to_query_string(request.data()));
            None
        }
    };

    let url = url::Url::parse(&url)?;
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Ok(WireRequest {
        method,
        url,
        headers,
        body: wire_body,
        timeout,
    })
}

/// Encode a structured payload as form or JSON, per the negotiated
/// content type.
fn encode_value(request: &mut Request, value: &Value) -> Result<bytes::Bytes> {
    if is_form_request(request) {
        request.set_header_if_absent("Content-Type", ContentType::FormUrlEncoded.as_str());
        to_form(value)
    } else {
        request.set_header_if_absent("Content-Type", ContentType::Json.as_str());
        to_json(value)
    }
}

/// Build the multipart body. Remaining parameters become text parts; the
/// form key and file name may be overridden through reserved parameters.
fn encode_multipart(request: &mut Request, body: Body) -> bytes::Bytes {
    let mut data = std::mem::take(request.data_mut());

    let key_override = data.shift_remove(FORM_KEY_PARAM).map(|v| value_to_string(&v));
    let name_override = data.shift_remove(FILE_NAME_PARAM).map(|v| value_to_string(&v));

    let mut form = match body {
        Body::Multipart(form) => form,
        Body::File { file_name, content } => {
            let key = request
                .file_form_key()
                .map(str::to_string)
                .or(key_override)
                .unwrap_or_else(|| DEFAULT_FORM_KEY.to_string());
            let file_name = name_override.unwrap_or(file_name);
            Form::new().file(key, file_name, content)
        }
        // encode() only routes uploads here
        Body::Value(_) | Body::Bytes(_) => Form::new(),
    };

    for (key, value) in &data {
        form = form.text(key.clone(), value_to_string(value));
    }

    let (content_type, bytes) = form.into_body();
    // the boundary lives in the header, so it always wins
    request.set_header("Content-Type", content_type);
    bytes
}

fn append_query(url: &mut String, query: &str) {
    if query.is_empty() {
        return;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(query);
}

fn is_form_request(request: &Request) -> bool {
    request.headers().iter().any(|(name, value)| {
        name.eq_ignore_ascii_case("content-type")
            && value
                .to_ascii_lowercase()
                .contains("x-www-form-urlencoded")
    })
}

/// Fold the cookie map into a single `Cookie` header, unless the caller
/// already set one.
fn fold_cookies(request: &mut Request) {
    if request.cookies().is_empty() {
        return;
    }
    let cookie = request
        .cookies()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    request.set_header_if_absent("Cookie", cookie);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    fn request(method: Method, url: &str) -> Request {
        Request::new(method, url, Duration::from_secs(5))
    }

    #[test]
    fn get_parameters_become_query_string() {
        let mut request = request(Method::Get, "http://api.test/city/find");
        request.add_param("name", json!("oslo"));
        request.add_param("id", json!([1, 2, 3]));

        let wire = encode(request).expect("encode");
        assert_eq!(
            wire.url.as_str(),
            "http://api.test/city/find?name=oslo&id=1&id=2&id=3"
        );
        assert!(wire.body.is_none());
    }

    #[test]
    fn post_parameters_become_json_body() {
        let mut request = request(Method::Post, "http://api.test/city/save");
        request.add_param("name", json!("oslo"));

        let wire = encode(request).expect("encode");
        assert_eq!(wire.url.as_str(), "http://api.test/city/save");
        assert_eq!(wire.body.as_deref(), Some(&br#"{"name":"oslo"}"#[..]));
        assert!(wire
            .headers
            .iter()
            .any(|(n, v)| n == "Content-Type" && v == "application/json"));
    }

    #[test]
    fn post_without_parameters_sends_no_body() {
        let request = request(Method::Post, "http://api.test/ping");

        let wire = encode(request).expect("encode");
        assert!(wire.body.is_none());
        assert!(!wire.headers.iter().any(|(n, _)| n == "Content-Type"));
    }

    #[test]
    fn explicit_body_pushes_parameters_to_query() {
        let mut request = request(Method::Post, "http://api.test/city/save");
        request.add_param("trace", json!("abc"));
        request.set_body(Body::Value(json!({"name": "oslo"})));

        let wire = encode(request).expect("encode");
        assert_eq!(wire.url.as_str(), "http://api.test/city/save?trace=abc");
        assert_eq!(wire.body.as_deref(), Some(&br#"{"name":"oslo"}"#[..]));
    }

    #[test]
    fn mirrored_body_fields_do_not_leak_into_query() {
        let mut request = request(Method::Post, "http://api.test/city/save");
        request.add_param("name", json!("oslo"));
        request.add_param("trace", json!("abc"));
        request.set_body(Body::Value(json!({"name": "oslo"})));

        let wire = encode(request).expect("encode");
        assert_eq!(wire.url.as_str(), "http://api.test/city/save?trace=abc");
    }

    #[test]
    fn form_content_type_switches_encoding() {
        let mut request = request(Method::Post, "http://api.test/city/save");
        request.set_header("Content-Type", ContentType::FormUrlEncoded.as_str());
        request.add_param("city", json!({"name": "oslo"}));

        let wire = encode(request).expect("encode");
        let body = wire.body.expect("body");
        assert_eq!(
            String::from_utf8_lossy(&body),
            "city%5Bname%5D=oslo"
        );
    }

    #[test]
    fn raw_bytes_pass_through() {
        let mut request = request(Method::Put, "http://api.test/blob");
        request.set_body(Body::Bytes(Bytes::from_static(b"\x01\x02")));

        let wire = encode(request).expect("encode");
        assert_eq!(wire.body.as_deref(), Some(&b"\x01\x02"[..]));
        assert!(wire
            .headers
            .iter()
            .any(|(n, v)| n == "Content-Type" && v == "application/octet-stream"));
    }

    #[test]
    fn upload_requires_post() {
        let mut request = request(Method::Get, "http://api.test/img");
        request.set_body(Body::File {
            file_name: "a.png".to_string(),
            content: Bytes::from_static(b"png"),
        });

        let error = encode(request).expect_err("upload on GET");
        assert!(matches!(error, Error::InvalidRequest(_)));
    }

    #[test]
    fn upload_defaults_to_media_key() {
        let mut request = request(Method::Post, "http://api.test/img");
        request.set_body(Body::File {
            file_name: "a.png".to_string(),
            content: Bytes::from_static(b"png"),
        });

        let wire = encode(request).expect("encode");
        let body = String::from_utf8_lossy(wire.body.as_deref().unwrap_or_default()).into_owned();
        assert!(body.contains("name=\"media\"; filename=\"a.png\""));
    }

    #[test]
    fn upload_key_and_name_overrides_from_parameters() {
        let mut request = request(Method::Post, "http://api.test/img");
        request.add_param("formKey", json!("avatar"));
        request.add_param("fileName", json!("me.png"));
        request.add_param("album", json!("travel"));
        request.set_body(Body::File {
            file_name: "a.png".to_string(),
            content: Bytes::from_static(b"png"),
        });

        let wire = encode(request).expect("encode");
        let body = String::from_utf8_lossy(wire.body.as_deref().unwrap_or_default()).into_owned();
        assert!(body.contains("name=\"avatar\"; filename=\"me.png\""));
        assert!(body.contains("name=\"album\""));
        assert!(body.contains("travel"));
        assert!(!body.contains("formKey"));
        assert!(!body.contains("fileName"));
    }

    #[test]
    fn cookies_fold_into_one_header() {
        let mut request = request(Method::Get, "http://api.test/city");
        request.set_cookie("session", "abc");

        let wire = encode(request).expect("encode");
        assert!(wire
            .headers
            .iter()
            .any(|(n, v)| n == "Cookie" && v == "session=abc"));
    }

    #[test]
    fn relative_url_is_rejected() {
        let request = request(Method::Get, "/city/find");
        let error = encode(request).expect_err("relative url");
        assert!(matches!(error, Error::InvalidUrl(_)));
    }
}

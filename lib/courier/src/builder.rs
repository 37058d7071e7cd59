//! Request construction: binds invocation arguments to a descriptor.
//!
//! Arguments are matched positionally against the descriptor's binding
//! list. A descriptor with no bindings accepts a single map-shaped
//! argument, flattened into the parameter map, or a single collection
//! or payload argument, used as the body. Static headers
//! and cookies are applied group-first so method-level and argument
//! values win on collision.

use courier_core::{
    value_to_string, ApiGroup, ArgValue, Args, Body, CallDescriptor, Error, ParamBinding, Request,
    Result,
};
use serde_json::{Map, Value};

/// Build the logical request for one invocation. `url` is the template
/// after configuration-placeholder resolution; path variables are still
/// unresolved.
pub(crate) fn build_request(
    group: &ApiGroup,
    descriptor: &CallDescriptor,
    url: String,
    args: Args,
) -> Result<Request> {
    let mut request = Request::new(descriptor.method(), url, descriptor.call_timeout());

    request.merge_headers(group.static_headers().clone());
    request.merge_cookies(group.static_cookies().clone());
    request.merge_headers(descriptor.static_headers().clone());
    request.merge_cookies(descriptor.static_cookies().clone());

    let bindings = descriptor.bindings();
    let values = args.into_values();

    if bindings.is_empty() && values.len() == 1 {
        let Some(value) = values.into_iter().next() else {
            return Ok(request);
        };
        bind_implicit(descriptor, value, &mut request)?;
        return Ok(request);
    }

    if bindings.len() != values.len() {
        return Err(Error::configuration(format!(
            "call `{}` declares {} parameter(s) but {} argument(s) were given",
            descriptor.name(),
            bindings.len(),
            values.len()
        )));
    }

    for (binding, value) in bindings.iter().zip(values) {
        bind(descriptor, binding, value, &mut request)?;
    }

    Ok(request)
}

/// A single argument with no declared binding: maps flatten into the
/// parameter map, collections and payloads become the body, bare
/// scalars are rejected.
fn bind_implicit(
    descriptor: &CallDescriptor,
    value: ArgValue,
    request: &mut Request,
) -> Result<()> {
    match value {
        ArgValue::Value(Value::Object(map)) => {
            flatten_into_data(map, request);
            Ok(())
        }
        ArgValue::Value(value @ Value::Array(_)) => {
            request.set_body(Body::Value(value));
            Ok(())
        }
        ArgValue::Value(other) => Err(Error::configuration(format!(
            "call `{}`: a bare {} argument needs a named parameter binding",
            descriptor.name(),
            kind_of(&other)
        ))),
        ArgValue::StrMap(map) => {
            for (key, value) in map {
                request.add_param(key, Value::String(value));
            }
            Ok(())
        }
        ArgValue::Bytes(bytes) => {
            request.set_body(Body::Bytes(bytes));
            Ok(())
        }
        ArgValue::File { file_name, content } => {
            request.set_body(Body::File { file_name, content });
            Ok(())
        }
        ArgValue::Multipart(form) => {
            request.set_body(Body::Multipart(form));
            Ok(())
        }
    }
}

fn bind(
    descriptor: &CallDescriptor,
    binding: &ParamBinding,
    value: ArgValue,
    request: &mut Request,
) -> Result<()> {
    match (binding, value) {
        (ParamBinding::Named(key), ArgValue::Value(value)) => {
            request.add_param(key.clone(), value);
            Ok(())
        }
        (ParamBinding::Named(key), ArgValue::StrMap(map)) => {
            let object = map.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
            request.add_param(key.clone(), Value::Object(object));
            Ok(())
        }
        (ParamBinding::Named(key), _) => Err(Error::configuration(format!(
            "call `{}`: parameter `{key}` cannot take a payload argument",
            descriptor.name()
        ))),

        (ParamBinding::Body, ArgValue::Value(value)) => {
            if let Value::Object(map) = &value {
                // body fields stay visible to path-variable substitution
                flatten_into_data(map.clone(), request);
            }
            request.set_body(Body::Value(value));
            Ok(())
        }
        (ParamBinding::Body, ArgValue::StrMap(map)) => {
            let object: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            flatten_into_data(object.clone(), request);
            request.set_body(Body::Value(Value::Object(object)));
            Ok(())
        }
        (ParamBinding::Body, ArgValue::Bytes(bytes)) => {
            request.set_body(Body::Bytes(bytes));
            Ok(())
        }
        (ParamBinding::Body, ArgValue::File { file_name, content }) => {
            request.set_body(Body::File { file_name, content });
            Ok(())
        }
        (ParamBinding::Body, ArgValue::Multipart(form)) => {
            request.set_body(Body::Multipart(form));
            Ok(())
        }

        (ParamBinding::Headers, value) => {
            let map = as_str_map(descriptor, "headers", value)?;
            request.merge_headers(map);
            Ok(())
        }
        (ParamBinding::Cookies, value) => {
            let map = as_str_map(descriptor, "cookies", value)?;
            request.merge_cookies(map);
            Ok(())
        }

        (ParamBinding::File(key), ArgValue::File { file_name, content }) => {
            request.set_body(Body::File { file_name, content });
            request.set_file_form_key(key.clone());
            Ok(())
        }
        (ParamBinding::File(key), ArgValue::Bytes(content)) => {
            request.set_body(Body::File {
                file_name: key.clone(),
                content,
            });
            request.set_file_form_key(key.clone());
            Ok(())
        }
        (ParamBinding::File(_), ArgValue::Multipart(form)) => {
            request.set_body(Body::Multipart(form));
            Ok(())
        }
        (ParamBinding::File(key), _) => Err(Error::configuration(format!(
            "call `{}`: file parameter `{key}` needs file bytes or a multipart form",
            descriptor.name()
        ))),
    }
}

fn flatten_into_data(map: Map<String, Value>, request: &mut Request) {
    for (key, value) in map {
        request.add_param(key, value);
    }
}

fn as_str_map(
    descriptor: &CallDescriptor,
    what: &str,
    value: ArgValue,
) -> Result<Vec<(String, String)>> {
    match value {
        ArgValue::StrMap(map) => Ok(map.into_iter().collect()),
        ArgValue::Value(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| {
                let v = value_to_string(&v);
                (k, v)
            })
            .collect()),
        _ => Err(Error::configuration(format!(
            "call `{}`: the {what} parameter needs a string map",
            descriptor.name()
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

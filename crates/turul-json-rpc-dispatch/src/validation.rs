//! # Request Validation
//!
//! Two independent passes:
//! - [`validate_envelope`] checks the outer request object (`jsonrpc`,
//!   `method`, `params`, `id`) and turns it into a [`JsonRpcRequest`].
//! - [`validate_params`] checks the supplied `params` against the shape of a
//!   method's [`ParamsSchema`] selected by the params kind.
//!
//! Both return [`ValidationErrors`] on failure; the dispatcher wraps them into
//! `InvalidRequest` and `InvalidParams` respectively.

use serde_json::{Map, Value};

use crate::JSONRPC_VERSION;
use crate::error::ValidationErrors;
use crate::request::{JsonRpcRequest, RequestParams};
use crate::schema::ParamsSchema;
use crate::types::{JsonRpcVersion, RequestId};

const ENVELOPE_MEMBERS: [&str; 4] = ["jsonrpc", "method", "params", "id"];

const INVALID_INPUT: &str = "Invalid input type.";
const MISSING_FIELD: &str = "Missing data for required field.";
const UNKNOWN_FIELD: &str = "Unknown field.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_ACCEPTED: &str = "Not an accepted value.";
const NOT_PARAMS: &str = "Not a valid array or object.";
const NOT_AN_ID: &str = "Not a valid string or integer.";

/// Validate a decoded request element.
///
/// `value` may be any JSON value; anything but an object fails with a single
/// `_schema` message. Every other violation is reported under its member name,
/// all of them collected before returning.
pub fn validate_envelope(value: &Value) -> Result<JsonRpcRequest, ValidationErrors> {
    let Value::Object(object) = value else {
        return Err(ValidationErrors::single(ValidationErrors::SCHEMA, INVALID_INPUT));
    };

    let mut errors = ValidationErrors::new();

    match object.get("jsonrpc") {
        None => errors.add("jsonrpc", MISSING_FIELD),
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(Value::String(_)) => errors.add("jsonrpc", NOT_ACCEPTED),
        Some(_) => errors.add("jsonrpc", NOT_A_STRING),
    }

    let method = match object.get("method") {
        None => {
            errors.add("method", MISSING_FIELD);
            None
        }
        Some(Value::String(method)) => Some(method.clone()),
        Some(_) => {
            errors.add("method", NOT_A_STRING);
            None
        }
    };

    let params = match object.get("params") {
        None => None,
        Some(Value::Array(items)) => Some(RequestParams::Array(items.clone())),
        Some(Value::Object(map)) => Some(RequestParams::Object(map.clone())),
        Some(_) => {
            errors.add("params", NOT_PARAMS);
            None
        }
    };

    let id = match object.get("id") {
        None => None,
        Some(raw) => {
            let id = RequestId::from_value(raw);
            if id.is_none() {
                errors.add("id", NOT_AN_ID);
            }
            id
        }
    };

    for key in unknown_members(object) {
        errors.add(key, UNKNOWN_FIELD);
    }

    match (errors.into_result(), method) {
        (Ok(()), Some(method)) => Ok(JsonRpcRequest {
            version: JsonRpcVersion::V2_0,
            method,
            params,
            id,
        }),
        (Err(errors), _) => Err(errors),
        // method is only None when an error was recorded for it
        (Ok(()), None) => Err(ValidationErrors::single("method", MISSING_FIELD)),
    }
}

fn unknown_members(object: &Map<String, Value>) -> impl Iterator<Item = &str> {
    object
        .keys()
        .map(String::as_str)
        .filter(|key| !ENVELOPE_MEMBERS.contains(key))
}

/// Validate supplied params against the matching shape of `schema`.
///
/// Returns the argument values in declaration order.
pub fn validate_params(
    schema: &ParamsSchema,
    params: &RequestParams,
) -> Result<Vec<Value>, ValidationErrors> {
    match params {
        RequestParams::Array(values) => schema.positional().validate(values),
        RequestParams::Object(map) => schema.named().validate(map),
    }
}

use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

/// A request envelope that passed envelope validation.
///
/// Only produced by [`validate_envelope`](crate::validation::validate_envelope);
/// `id` is `None` for notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub version: JsonRpcVersion,
    pub method: String,
    pub params: Option<RequestParams>,
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

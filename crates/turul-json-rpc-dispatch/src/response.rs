use serde::Serialize;
use serde_json::Value;

use crate::error::{JsonRpcError, JsonRpcErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// Exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseOutcome {
    Result(Value),
    Error(JsonRpcErrorObject),
}

/// A JSON-RPC response object.
///
/// `id` serializes as `null` when it is `None`; that only happens for parse
/// errors and for requests whose `id` member failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    pub fn new(id: Option<RequestId>, outcome: ResponseOutcome) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            outcome,
            id,
        }
    }

    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self::new(id, ResponseOutcome::Result(result))
    }

    pub fn error(id: Option<RequestId>, error: &JsonRpcError) -> Self {
        Self::new(id, ResponseOutcome::Error(error.to_error_object()))
    }

    /// The response sent for a payload that is not valid JSON
    pub fn parse_error() -> Self {
        Self::error(None, &JsonRpcError::ParseError)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(value) => Some(value),
            ResponseOutcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcErrorObject> {
        match &self.outcome {
            ResponseOutcome::Error(error) => Some(error),
            ResponseOutcome::Result(_) => None,
        }
    }
}

/// What goes back for one processed payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    Single(JsonRpcResponse),
    /// Non-suppressed responses of a batch, in request order
    Batch(Vec<JsonRpcResponse>),
}

impl JsonRpcReply {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn responses(&self) -> &[JsonRpcResponse] {
        match self {
            JsonRpcReply::Single(response) => std::slice::from_ref(response),
            JsonRpcReply::Batch(responses) => responses,
        }
    }
}

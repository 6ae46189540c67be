use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::schema::ParamType;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Validation messages keyed by the offending field.
///
/// Keys are envelope member names, parameter names, positional indices
/// rendered as strings, or `_schema` for failures that concern the value as a
/// whole. Serializes as `{"<key>": ["<message>", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Key used for failures that are not tied to a single field
    pub const SCHEMA: &'static str = "_schema";

    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single message under one key
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when no message was collected
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, messages)| (field.clone(), json!(messages)))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data,
        }
    }
}

/// The protocol-level failures a request can end in
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JsonRpcError {
    #[error("Parse error")]
    ParseError,

    #[error("Invalid request: {0}")]
    InvalidRequest(ValidationErrors),

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid params: {0}")]
    InvalidParams(ValidationErrors),

    /// Detail of the underlying failure is logged, never carried here
    #[error("Internal error")]
    InternalError,
}

impl JsonRpcError {
    pub fn method_not_found(method: impl Into<String>) -> Self {
        JsonRpcError::MethodNotFound {
            method: method.into(),
        }
    }

    pub fn kind(&self) -> JsonRpcErrorCode {
        match self {
            JsonRpcError::ParseError => JsonRpcErrorCode::ParseError,
            JsonRpcError::InvalidRequest(_) => JsonRpcErrorCode::InvalidRequest,
            JsonRpcError::MethodNotFound { .. } => JsonRpcErrorCode::MethodNotFound,
            JsonRpcError::InvalidParams(_) => JsonRpcErrorCode::InvalidParams,
            JsonRpcError::InternalError => JsonRpcErrorCode::InternalError,
        }
    }

    pub fn code(&self) -> i64 {
        self.kind().code()
    }

    pub fn message(&self) -> &'static str {
        self.kind().message()
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            JsonRpcError::ParseError | JsonRpcError::InternalError => None,
            JsonRpcError::InvalidRequest(errors) | JsonRpcError::InvalidParams(errors) => {
                Some(errors.to_value())
            }
            JsonRpcError::MethodNotFound { method } => Some(json!({ "method": method })),
        }
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject::new(self.kind(), self.data())
    }
}

impl From<JsonRpcError> for JsonRpcErrorObject {
    fn from(error: JsonRpcError) -> Self {
        error.to_error_object()
    }
}

/// Rejections raised while registering a method
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Method name must not be empty")]
    EmptyMethodName,

    #[error("Method '{method}' takes {expected} parameters but {given} names were supplied")]
    ArityMismatch {
        method: String,
        expected: usize,
        given: usize,
    },

    #[error("Method '{method}' declares parameter '{param}' more than once")]
    DuplicateParam { method: String, param: String },
}

/// Failures reading a handler argument out of [`crate::Arguments`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Missing argument at position {0}")]
    MissingIndex(usize),

    #[error("Missing argument '{0}'")]
    MissingName(String),

    #[error("Argument '{name}' is not a valid {expected}")]
    WrongType { name: String, expected: ParamType },
}

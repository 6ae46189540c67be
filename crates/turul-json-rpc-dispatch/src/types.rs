use serde::Serialize;
use serde_json::Value;

/// Identifier of a JSON-RPC request.
/// Either a string or an integer, never null, fractional, array or object.
/// Integers above `i64::MAX` are kept as [`RequestId::Unsigned`] so they echo
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Unsigned(u64),
}

impl RequestId {
    /// Read an id from a raw `id` member, rejecting every non string/integer value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(RequestId::Number)
                .or_else(|| n.as_u64().map(RequestId::Unsigned)),
            _ => None,
        }
    }
}

/// JSON-RPC version marker, serialized as the literal `"2.0"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Truthiness of a raw JSON value: `null`, `false`, `0`, `0.0`, `""`, `[]` and `{}` are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

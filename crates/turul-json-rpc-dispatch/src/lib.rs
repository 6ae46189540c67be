//! # JSON-RPC 2.0 Request Dispatch
//!
//! A transport-agnostic JSON-RPC 2.0 request processor. Raw request text goes
//! in, framed response text (or nothing, for notifications) comes out.
//!
//! ## Features
//! - Envelope validation with per-field diagnostic messages
//! - Per-method parameter schemas derived from typed handler signatures
//! - Positional (array) and named (object) parameter binding
//! - Batch processing with order preservation and independent failures
//! - Handler failures reported as opaque `Internal error`, detail logged via `tracing`
//!
//! ```rust
//! use turul_json_rpc_dispatch::Dispatcher;
//!
//! fn add(a: i64, b: i64) -> anyhow::Result<i64> {
//!     Ok(a + b)
//! }
//!
//! let dispatcher = Dispatcher::builder()
//!     .method("add", &["a", "b"], add)
//!     .build()
//!     .unwrap();
//!
//! let response = dispatcher.process(r#"{"jsonrpc":"2.0","method":"add","params":[2,3],"id":1}"#);
//! assert_eq!(response.as_deref(), Some(r#"{"jsonrpc":"2.0","result":5,"id":1}"#));
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod schema;
pub mod types;
pub mod validation;

// Re-export main types
pub use config::{DispatcherConfig, NotificationPolicy};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use error::{
    ArgumentError, JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, RegistrationError,
    ValidationErrors,
};
pub use handler::{Arguments, BoxedHandler, FromParam, IntoMethod};
pub use registry::{MethodEntry, MethodRegistry};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcReply, JsonRpcResponse, ResponseOutcome};
pub use schema::{NamedSchema, ParamSpec, ParamType, ParamsSchema, PositionalSchema};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

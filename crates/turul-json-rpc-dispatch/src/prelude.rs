//! # JSON-RPC Dispatch Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use turul_json_rpc_dispatch::prelude::*;
//! ```

pub use crate::config::{DispatcherConfig, NotificationPolicy};
pub use crate::dispatch::{Dispatcher, DispatcherBuilder};
pub use crate::error::{JsonRpcError, JsonRpcErrorCode, RegistrationError, ValidationErrors};
pub use crate::handler::{Arguments, FromParam};
pub use crate::registry::MethodRegistry;
pub use crate::request::{JsonRpcRequest, RequestParams};
pub use crate::response::{JsonRpcReply, JsonRpcResponse};
pub use crate::schema::{ParamSpec, ParamType, ParamsSchema};
pub use crate::types::RequestId;

// Standard error codes
pub use crate::error_codes::*;

//! # Request Dispatch
//!
//! Runs the pipeline for a raw payload:
//! parse → envelope validation → method lookup → params validation → invoke →
//! response assembly. Batches run the same pipeline per element and keep the
//! input order. The dispatcher is immutable once built, so it can be shared
//! across threads and called concurrently.

use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::config::{DispatcherConfig, NotificationPolicy};
use crate::error::{JsonRpcError, RegistrationError, ValidationErrors};
use crate::handler::{Arguments, IntoMethod};
use crate::registry::{MethodEntry, MethodRegistry};
use crate::request::JsonRpcRequest;
use crate::response::{JsonRpcReply, JsonRpcResponse};
use crate::schema::ParamsSchema;
use crate::types::{RequestId, is_truthy};
use crate::validation::{validate_envelope, validate_params};

/// JSON-RPC dispatcher over a fixed set of methods
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_config(registry, DispatcherConfig::default())
    }

    pub fn with_config(registry: MethodRegistry, config: DispatcherConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Process a raw payload.
    ///
    /// Returns the serialized reply, or `None` when there is nothing to send
    /// (a single notification).
    pub fn process(&self, raw: &str) -> Option<String> {
        trace!(bytes = raw.len(), "Processing payload");

        let reply = match serde_json::from_str(raw) {
            Ok(value) => self.process_value(value)?,
            Err(_) => {
                trace!("Payload is not valid JSON");
                JsonRpcReply::Single(JsonRpcResponse::parse_error())
            }
        };

        Some(frame(reply.to_json_string()))
    }

    /// Process an already decoded payload
    pub fn process_value(&self, value: Value) -> Option<JsonRpcReply> {
        match value {
            Value::Array(batch) => Some(self.process_batch(&batch)),
            request => self.handle(&request).map(JsonRpcReply::Single),
        }
    }

    fn process_batch(&self, batch: &[Value]) -> JsonRpcReply {
        trace!(len = batch.len(), "Processing batch");

        if let Some(limit) = self.config.max_batch_size
            && batch.len() > limit
        {
            trace!(len = batch.len(), limit, "Batch exceeds the configured limit");
            let errors = ValidationErrors::single(
                ValidationErrors::SCHEMA,
                format!(
                    "Batch of {} requests exceeds the limit of {}.",
                    batch.len(),
                    limit
                ),
            );
            return JsonRpcReply::Single(JsonRpcResponse::error(
                None,
                &JsonRpcError::InvalidRequest(errors),
            ));
        }

        JsonRpcReply::Batch(batch.iter().filter_map(|request| self.handle(request)).collect())
    }

    /// Handle one request element.
    ///
    /// The request is always executed; `None` means its response is
    /// suppressed under the configured [`NotificationPolicy`].
    pub fn handle(&self, request: &Value) -> Option<JsonRpcResponse> {
        let outcome = self.execute(request);
        let id = self.response_id(request)?;

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::error(id, &err),
        })
    }

    /// `None` suppresses the response; `Some(None)` answers with `"id": null`
    fn response_id(&self, request: &Value) -> Option<Option<RequestId>> {
        let raw = request.as_object()?.get("id")?;
        if self.config.notification_policy == NotificationPolicy::Truthy && !is_truthy(raw) {
            return None;
        }
        Some(RequestId::from_value(raw))
    }

    fn execute(&self, value: &Value) -> Result<Value, JsonRpcError> {
        let request = validate_envelope(value).map_err(|errors| {
            trace!("Invalid request envelope");
            JsonRpcError::InvalidRequest(errors)
        })?;

        let entry = self.registry.resolve(&request.method).inspect_err(|_| {
            trace!("Method not found");
        })?;

        let args = match &request.params {
            None => Arguments::absent(entry.schema()),
            Some(params) => {
                let values = validate_params(entry.schema(), params).map_err(|errors| {
                    trace!("Invalid params");
                    JsonRpcError::InvalidParams(errors)
                })?;
                Arguments::new(entry.schema(), values)
            }
        };

        debug!(method = %request.method, id = ?request.id, args = args.len(), "Dispatching");
        self.invoke(entry, &request, &args)
    }

    fn invoke(
        &self,
        entry: &MethodEntry,
        request: &JsonRpcRequest,
        args: &Arguments,
    ) -> Result<Value, JsonRpcError> {
        let outcome = if self.config.catch_panics {
            match panic::catch_unwind(AssertUnwindSafe(|| entry.call(args))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    error!(
                        method = entry.name(),
                        id = ?request.id,
                        panic = %panic_message(payload.as_ref()),
                        "Handler panicked"
                    );
                    return Err(JsonRpcError::InternalError);
                }
            }
        } else {
            entry.call(args)
        };

        outcome.map_err(|err| {
            error!(method = entry.name(), id = ?request.id, error = ?err, "Handler failed");
            JsonRpcError::InternalError
        })
    }
}

/// Serialized reply text. Encoding failure still answers, with a bare
/// `Internal error`, so `None` from [`Dispatcher::process`] only ever means
/// there was nothing to send.
fn frame(encoded: serde_json::Result<String>) -> String {
    encoded.unwrap_or_else(|err| {
        error!(error = %err, "Failed to serialize reply");
        ENCODING_FAILURE.to_string()
    })
}

const ENCODING_FAILURE: &str =
    r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Builder for [`Dispatcher`]
///
/// Registration errors are collected while building and reported by
/// [`DispatcherBuilder::build`].
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    registry: MethodRegistry,
    config: DispatcherConfig,
    errors: Vec<RegistrationError>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every method of an existing registry.
    ///
    /// Methods registered earlier on the builder are kept; same-named methods
    /// from `registry` replace them.
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry.merge(registry);
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notification_policy(mut self, policy: NotificationPolicy) -> Self {
        self.config.notification_policy = policy;
        self
    }

    pub fn max_batch_size(mut self, limit: usize) -> Self {
        self.config.max_batch_size = Some(limit);
        self
    }

    pub fn catch_panics(mut self, enabled: bool) -> Self {
        self.config.catch_panics = enabled;
        self
    }

    /// Register a typed function, see [`MethodRegistry::register`]
    pub fn method<F, Args>(mut self, name: impl Into<String>, param_names: &[&str], handler: F) -> Self
    where
        F: IntoMethod<Args>,
    {
        if let Err(err) = self.registry.register(name, param_names, handler) {
            self.errors.push(err);
        }
        self
    }

    /// Register a raw handler, see [`MethodRegistry::register_raw`]
    pub fn raw_method<F>(mut self, name: impl Into<String>, schema: ParamsSchema, handler: F) -> Self
    where
        F: Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        if let Err(err) = self.registry.register_raw(name, schema, handler) {
            self.errors.push(err);
        }
        self
    }

    pub fn build(self) -> Result<Dispatcher, RegistrationError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        Ok(Dispatcher::with_config(self.registry, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamSpec;
    use serde_json::json;

    fn add(a: i64, b: i64) -> anyhow::Result<i64> {
        Ok(a + b)
    }

    fn fail() -> anyhow::Result<()> {
        anyhow::bail!("database password is hunter2")
    }

    fn explode() -> anyhow::Result<()> {
        panic!("boom")
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder()
            .method("add", &["a", "b"], add)
            .method("fail", &[], fail)
            .method("explode", &[], explode)
            .build()
            .unwrap()
    }

    fn call(dispatcher: &Dispatcher, request: Value) -> Option<Value> {
        dispatcher
            .process(&request.to_string())
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[test]
    fn test_positional_call() {
        let response = call(
            &dispatcher(),
            json!({"jsonrpc": "2.0", "method": "add", "params": [2, 3], "id": 1}),
        );
        assert_eq!(response, Some(json!({"jsonrpc": "2.0", "result": 5, "id": 1})));
    }

    #[test]
    fn test_named_call() {
        let response = call(
            &dispatcher(),
            json!({"jsonrpc": "2.0", "method": "add", "params": {"a": 2, "b": 3}, "id": "x"}),
        );
        assert_eq!(response, Some(json!({"jsonrpc": "2.0", "result": 5, "id": "x"})));
    }

    #[test]
    fn test_exact_output_text() {
        let raw = dispatcher().process(r#"{"jsonrpc":"2.0","method":"add","params":[2,3],"id":1}"#);
        assert_eq!(raw.as_deref(), Some(r#"{"jsonrpc":"2.0","result":5,"id":1}"#));
    }

    #[test]
    fn test_parse_error() {
        let raw = dispatcher().process(r#"{"jsonrpc": "2.0", "method": "#).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&raw).unwrap(),
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
        );
    }

    #[test]
    fn test_handler_error_is_opaque() {
        let raw = dispatcher()
            .process(r#"{"jsonrpc":"2.0","method":"fail","id":7}"#)
            .unwrap();
        assert!(!raw.contains("hunter2"));
        assert_eq!(
            serde_json::from_str::<Value>(&raw).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32603, "message": "Internal error"}, "id": 7})
        );
    }

    #[test]
    fn test_handler_panic_is_internal_error() {
        let response = call(&dispatcher(), json!({"jsonrpc": "2.0", "method": "explode", "id": 1})).unwrap();
        assert_eq!(response["error"]["code"], json!(-32603));
    }

    #[test]
    fn test_absent_params_skip_validation() {
        // add is invoked with no arguments and fails inside the handler
        let response = call(&dispatcher(), json!({"jsonrpc": "2.0", "method": "add", "id": 1})).unwrap();
        assert_eq!(response["error"]["code"], json!(-32603));
    }

    #[test]
    fn test_empty_params_are_validated() {
        let response = call(
            &dispatcher(),
            json!({"jsonrpc": "2.0", "method": "add", "params": [], "id": 1}),
        )
        .unwrap();
        assert_eq!(response["error"]["code"], json!(-32602));
        assert_eq!(
            response["error"]["data"],
            json!({"_schema": ["Expected 2 positional parameters, got 0."]})
        );
    }

    #[test]
    fn test_notification_is_executed_but_silent() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let dispatcher = Dispatcher::builder()
            .raw_method("tick", ParamsSchema::empty(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            })
            .build()
            .unwrap();

        assert_eq!(dispatcher.process(r#"{"jsonrpc":"2.0","method":"tick"}"#), None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_id_answers_with_null() {
        let response = call(
            &dispatcher(),
            json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 1.5}),
        )
        .unwrap();
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], json!(-32600));
        assert_eq!(response["error"]["data"], json!({"id": ["Not a valid string or integer."]}));
    }

    #[test]
    fn test_presence_policy_answers_falsy_ids() {
        let dispatcher = dispatcher();
        let response = call(&dispatcher, json!({"jsonrpc": "2.0", "method": "add", "params": [1, 1], "id": 0}));
        assert_eq!(response, Some(json!({"jsonrpc": "2.0", "result": 2, "id": 0})));

        let response = call(&dispatcher, json!({"jsonrpc": "2.0", "method": "add", "params": [1, 1], "id": ""}));
        assert_eq!(response, Some(json!({"jsonrpc": "2.0", "result": 2, "id": ""})));
    }

    #[test]
    fn test_truthy_policy_suppresses_falsy_ids() {
        let dispatcher = Dispatcher::builder()
            .notification_policy(NotificationPolicy::Truthy)
            .method("add", &["a", "b"], add)
            .build()
            .unwrap();

        for id in [json!(0), json!(""), json!(null), json!(false)] {
            let raw = json!({"jsonrpc": "2.0", "method": "add", "params": [1, 1], "id": id.clone()}).to_string();
            assert_eq!(dispatcher.process(&raw), None, "id {id} should be suppressed");
        }
        assert!(
            dispatcher
                .process(r#"{"jsonrpc":"2.0","method":"add","params":[1,1],"id":3}"#)
                .is_some()
        );
    }

    #[test]
    fn test_batch_limit() {
        let dispatcher = Dispatcher::builder()
            .max_batch_size(1)
            .method("add", &["a", "b"], add)
            .build()
            .unwrap();

        let batch = json!([
            {"jsonrpc": "2.0", "method": "add", "params": [1, 1], "id": 1},
            {"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 2}
        ]);
        let response = call(&dispatcher, batch).unwrap();
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], json!(-32600));
        assert_eq!(
            response["error"]["data"],
            json!({"_schema": ["Batch of 2 requests exceeds the limit of 1."]})
        );
    }

    #[test]
    fn test_builder_reports_first_registration_error() {
        let err = Dispatcher::builder()
            .method("add", &["a"], add)
            .raw_method("echo", ParamsSchema::empty(), |_| Ok(Value::Null))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::ArityMismatch { .. }));
    }

    #[test]
    fn test_builder_from_registry() {
        let mut registry = MethodRegistry::new();
        registry
            .register_raw(
                "shout",
                ParamsSchema::new("shout", vec![ParamSpec::string("text")]).unwrap(),
                |args| Ok(Value::String(args.get::<String>(0)?.to_uppercase())),
            )
            .unwrap();

        let dispatcher = Dispatcher::builder().registry(registry).build().unwrap();
        let response = call(
            &dispatcher,
            json!({"jsonrpc": "2.0", "method": "shout", "params": {"text": "hi"}, "id": 1}),
        );
        assert_eq!(response, Some(json!({"jsonrpc": "2.0", "result": "HI", "id": 1})));
        assert_eq!(dispatcher.registry().method_names(), vec!["shout".to_string()]);
    }

    #[test]
    fn test_registry_after_methods_keeps_them() {
        let mut registry = MethodRegistry::new();
        registry
            .register_raw("ping", ParamsSchema::empty(), |_| Ok(json!("pong")))
            .unwrap();

        let dispatcher = Dispatcher::builder()
            .method("add", &["a", "b"], add)
            .registry(registry)
            .build()
            .unwrap();

        assert_eq!(dispatcher.registry().method_names(), vec!["add", "ping"]);
        let response = call(
            &dispatcher,
            json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 1}),
        );
        assert_eq!(response, Some(json!({"jsonrpc": "2.0", "result": 3, "id": 1})));
    }

    #[test]
    fn test_id_beyond_i64_is_echoed() {
        let raw = dispatcher()
            .process(r#"{"jsonrpc":"2.0","method":"add","params":[1,2],"id":9223372036854775808}"#);
        assert_eq!(
            raw.as_deref(),
            Some(r#"{"jsonrpc":"2.0","result":3,"id":9223372036854775808}"#)
        );
    }

    #[test]
    fn test_encoding_failure_still_answers() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let raw = frame(Err(err));
        assert_eq!(
            serde_json::from_str::<Value>(&raw).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32603, "message": "Internal error"}, "id": null})
        );
        assert_eq!(frame(Ok("[]".to_string())), "[]");
    }
}

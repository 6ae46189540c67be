//! # Method Registry
//!
//! Maps method names to their registration record: the handler plus the
//! [`ParamsSchema`] derived when it was registered. Re-registering a name
//! replaces the previous record.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{JsonRpcError, RegistrationError};
use crate::handler::{Arguments, BoxedHandler, IntoMethod};
use crate::schema::{NamedSchema, ParamsSchema, PositionalSchema};

/// Registration record of one method
#[derive(Clone)]
pub struct MethodEntry {
    name: String,
    handler: BoxedHandler,
    schema: ParamsSchema,
}

impl MethodEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub fn schema(&self) -> &ParamsSchema {
        &self.schema
    }

    pub fn positional_schema(&self) -> &PositionalSchema {
        self.schema.positional()
    }

    pub fn named_schema(&self) -> &NamedSchema {
        self.schema.named()
    }

    pub fn call(&self, args: &Arguments) -> anyhow::Result<Value> {
        (self.handler)(args)
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Method name to registration record
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodEntry>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed function under `name`.
    ///
    /// `param_names` names the function's arguments in order; the types come
    /// from the function signature.
    pub fn register<F, Args>(
        &mut self,
        name: impl Into<String>,
        param_names: &[&str],
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        F: IntoMethod<Args>,
    {
        let name = name.into();
        let schema = ParamsSchema::from_names_and_types(&name, param_names, F::param_types())?;
        self.insert(name, schema, handler.into_handler())
    }

    /// Register a handler that reads its own [`Arguments`] against an explicit schema
    pub fn register_raw<F>(
        &mut self,
        name: impl Into<String>,
        schema: ParamsSchema,
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert(name.into(), schema, Arc::new(handler))
    }

    fn insert(
        &mut self,
        name: String,
        schema: ParamsSchema,
        handler: BoxedHandler,
    ) -> Result<(), RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyMethodName);
        }

        debug!(method = %name, params = ?schema.param_names(), "Registering method");
        let entry = MethodEntry {
            name: name.clone(),
            handler,
            schema,
        };
        if self.methods.insert(name.clone(), entry).is_some() {
            warn!(method = %name, "Method re-registered, previous handler replaced");
        }
        Ok(())
    }

    /// Move every method of `other` into this registry.
    ///
    /// Methods of `other` replace same-named ones already registered here.
    pub fn merge(&mut self, other: MethodRegistry) {
        for (name, entry) in other.methods {
            if self.methods.insert(name.clone(), entry).is_some() {
                warn!(method = %name, "Method re-registered, previous handler replaced");
            }
        }
    }

    /// Look up a method by name
    pub fn resolve(&self, name: &str) -> Result<&MethodEntry, JsonRpcError> {
        self.methods
            .get(name)
            .ok_or_else(|| JsonRpcError::method_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

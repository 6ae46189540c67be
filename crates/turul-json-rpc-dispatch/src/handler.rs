//! # Method Handlers
//!
//! Handlers are plain Rust functions whose argument types implement
//! [`FromParam`]. The argument types give the parameter schema its types;
//! the names are supplied at registration, since Rust has no runtime access
//! to parameter names.
//!
//! ```rust
//! fn add(a: i64, b: i64) -> anyhow::Result<i64> {
//!     Ok(a + b)
//! }
//!
//! let mut registry = turul_json_rpc_dispatch::MethodRegistry::new();
//! registry.register("add", &["a", "b"], add).unwrap();
//! ```

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ArgumentError;
use crate::schema::{ParamType, ParamsSchema};

/// Type-erased handler stored in the registry
pub type BoxedHandler = Arc<dyn Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync>;

/// Rust types that can be bound from a declared parameter
pub trait FromParam: Sized {
    const PARAM_TYPE: ParamType;

    fn from_param(value: &Value) -> Option<Self>;
}

impl FromParam for i64 {
    const PARAM_TYPE: ParamType = ParamType::Integer;

    fn from_param(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromParam for String {
    const PARAM_TYPE: ParamType = ParamType::String;

    fn from_param(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromParam for bool {
    const PARAM_TYPE: ParamType = ParamType::Boolean;

    fn from_param(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

/// Validated arguments of one call, in declaration order.
///
/// Empty when the request carried no `params` member.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Arguments {
    pub(crate) fn new(schema: &ParamsSchema, values: Vec<Value>) -> Self {
        Self {
            names: schema.params().iter().map(|p| p.name.clone()).collect(),
            values,
        }
    }

    /// Arguments of a call made without `params`
    pub(crate) fn absent(schema: &ParamsSchema) -> Self {
        Self::new(schema, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Read the argument at `index`
    pub fn get<T: FromParam>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self
            .values
            .get(index)
            .ok_or(ArgumentError::MissingIndex(index))?;
        let name = self
            .names
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string());
        T::from_param(value).ok_or(ArgumentError::WrongType {
            name,
            expected: T::PARAM_TYPE,
        })
    }

    /// Read the argument declared as `name`
    pub fn get_named<T: FromParam>(&self, name: &str) -> Result<T, ArgumentError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .filter(|index| *index < self.values.len())
            .ok_or_else(|| ArgumentError::MissingName(name.to_string()))?;
        self.get(index)
    }
}

/// Functions that can be registered as methods.
///
/// Implemented for `Fn(A1, .., An) -> anyhow::Result<R>` with up to six
/// [`FromParam`] arguments and a [`Serialize`] result.
pub trait IntoMethod<Args>: Send + Sync + 'static {
    fn param_types() -> Vec<ParamType>;

    fn into_handler(self) -> BoxedHandler;
}

macro_rules! impl_into_method {
    ($($arg:ident => $idx:tt),*) => {
        impl<Func, Ret, $($arg,)*> IntoMethod<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> anyhow::Result<Ret> + Send + Sync + 'static,
            Ret: Serialize,
            $($arg: FromParam,)*
        {
            fn param_types() -> Vec<ParamType> {
                vec![$($arg::PARAM_TYPE),*]
            }

            #[allow(unused_variables)]
            fn into_handler(self) -> BoxedHandler {
                Arc::new(move |args: &Arguments| -> anyhow::Result<Value> {
                    let result = (self)($(args.get::<$arg>($idx)?),*)?;
                    Ok(serde_json::to_value(result)?)
                })
            }
        }
    };
}

impl_into_method!();
impl_into_method!(A1 => 0);
impl_into_method!(A1 => 0, A2 => 1);
impl_into_method!(A1 => 0, A2 => 1, A3 => 2);
impl_into_method!(A1 => 0, A2 => 1, A3 => 2, A4 => 3);
impl_into_method!(A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4);
impl_into_method!(A1 => 0, A2 => 1, A3 => 2, A4 => 3, A5 => 4, A6 => 5);

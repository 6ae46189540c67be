//! # Parameter Schemas
//!
//! Every registered method carries a [`ParamsSchema`] derived from its
//! declared parameter list. The schema holds two fixed shapes built from the
//! same declaration: a positional tuple (bound by declaration order) and a
//! named mapping (bound by parameter name). All parameters are required and no
//! extra parameter is accepted in either shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::fmt;

use crate::error::{RegistrationError, ValidationErrors};

const MISSING_FIELD: &str = "Missing data for required field.";
const UNKNOWN_FIELD: &str = "Unknown field.";

/// Primitive types a parameter can be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    String,
    Boolean,
}

impl ParamType {
    /// Strict type check: no coercion between JSON types
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::Integer => value.as_i64().is_some(),
            ParamType::String => value.is_string(),
            ParamType::Boolean => value.is_boolean(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
        }
    }

    fn invalid_message(&self) -> String {
        format!("Not a valid {}.", self.as_str())
    }

    fn json_schema(&self) -> Value {
        json!({ "type": self.as_str() })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared parameter: name plus primitive type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }
}

/// Ordered-tuple shape: `params` given as an array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSchema {
    types: Vec<ParamType>,
}

impl PositionalSchema {
    pub fn types(&self) -> &[ParamType] {
        &self.types
    }

    /// Validate an ordered argument list, returning it unchanged on success
    pub fn validate(&self, values: &[Value]) -> Result<Vec<Value>, ValidationErrors> {
        if values.len() != self.types.len() {
            return Err(ValidationErrors::single(
                ValidationErrors::SCHEMA,
                format!(
                    "Expected {} positional parameters, got {}.",
                    self.types.len(),
                    values.len()
                ),
            ));
        }

        let mut errors = ValidationErrors::new();
        for (index, (ty, value)) in self.types.iter().zip(values).enumerate() {
            if !ty.accepts(value) {
                errors.add(index.to_string(), ty.invalid_message());
            }
        }
        errors.into_result()?;
        Ok(values.to_vec())
    }
}

/// Named-mapping shape: `params` given as an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSchema {
    fields: Vec<ParamSpec>,
}

impl NamedSchema {
    pub fn fields(&self) -> &[ParamSpec] {
        &self.fields
    }

    /// Validate keyword arguments, returning the values in declaration order
    pub fn validate(&self, values: &Map<String, Value>) -> Result<Vec<Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut ordered = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            match values.get(&field.name) {
                None => errors.add(field.name.as_str(), MISSING_FIELD),
                Some(value) if !field.ty.accepts(value) => {
                    errors.add(field.name.as_str(), field.ty.invalid_message())
                }
                Some(value) => ordered.push(value.clone()),
            }
        }

        for key in values.keys() {
            if !self.fields.iter().any(|field| &field.name == key) {
                errors.add(key.as_str(), UNKNOWN_FIELD);
            }
        }

        errors.into_result()?;
        Ok(ordered)
    }
}

/// Per-method parameter schema, built once at registration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsSchema {
    positional: PositionalSchema,
    named: NamedSchema,
}

impl ParamsSchema {
    /// Build both shapes from an ordered declaration.
    ///
    /// `method` only feeds the error message when a name is declared twice.
    pub fn new(method: &str, params: Vec<ParamSpec>) -> Result<Self, RegistrationError> {
        let mut seen = HashSet::new();
        for param in &params {
            if !seen.insert(param.name.as_str()) {
                return Err(RegistrationError::DuplicateParam {
                    method: method.to_string(),
                    param: param.name.clone(),
                });
            }
        }

        Ok(Self {
            positional: PositionalSchema {
                types: params.iter().map(|param| param.ty).collect(),
            },
            named: NamedSchema { fields: params },
        })
    }

    /// Schema of a method that takes no parameters
    pub fn empty() -> Self {
        Self {
            positional: PositionalSchema { types: Vec::new() },
            named: NamedSchema { fields: Vec::new() },
        }
    }

    /// Pair declared names with types, in order
    pub(crate) fn from_names_and_types(
        method: &str,
        names: &[&str],
        types: Vec<ParamType>,
    ) -> Result<Self, RegistrationError> {
        if names.len() != types.len() {
            return Err(RegistrationError::ArityMismatch {
                method: method.to_string(),
                expected: types.len(),
                given: names.len(),
            });
        }
        let params = names
            .iter()
            .zip(types)
            .map(|(name, ty)| ParamSpec::new(*name, ty))
            .collect();
        Self::new(method, params)
    }

    pub fn positional(&self) -> &PositionalSchema {
        &self.positional
    }

    pub fn named(&self) -> &NamedSchema {
        &self.named
    }

    pub fn params(&self) -> &[ParamSpec] {
        self.named.fields()
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params().iter().map(|param| param.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.params().len()
    }

    pub fn is_empty(&self) -> bool {
        self.params().is_empty()
    }

    /// Render both accepted shapes as a JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        let prefix_items: Vec<Value> = self.params().iter().map(|p| p.ty.json_schema()).collect();
        let properties: Map<String, Value> = self
            .params()
            .iter()
            .map(|p| (p.name.clone(), p.ty.json_schema()))
            .collect();

        json!({
            "oneOf": [
                {
                    "type": "array",
                    "prefixItems": prefix_items,
                    "minItems": self.len(),
                    "maxItems": self.len(),
                },
                {
                    "type": "object",
                    "properties": properties,
                    "required": self.param_names(),
                    "additionalProperties": false,
                },
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_schema() -> ParamsSchema {
        ParamsSchema::new("add", vec![ParamSpec::integer("a"), ParamSpec::integer("b")]).unwrap()
    }

    #[test]
    fn test_param_type_is_strict() {
        assert!(ParamType::Integer.accepts(&json!(3)));
        assert!(ParamType::Integer.accepts(&json!(-3)));
        assert!(!ParamType::Integer.accepts(&json!(3.0)));
        assert!(!ParamType::Integer.accepts(&json!("3")));
        assert!(!ParamType::Integer.accepts(&json!(true)));
        assert!(ParamType::String.accepts(&json!("x")));
        assert!(!ParamType::String.accepts(&json!(1)));
        assert!(ParamType::Boolean.accepts(&json!(false)));
        assert!(!ParamType::Boolean.accepts(&json!(0)));
    }

    #[test]
    fn test_positional_accepts_matching_tuple() {
        let values = add_schema().positional().validate(&[json!(2), json!(3)]).unwrap();
        assert_eq!(values, vec![json!(2), json!(3)]);
    }

    #[test]
    fn test_positional_rejects_wrong_type_by_index() {
        let errors = add_schema()
            .positional()
            .validate(&[json!(2), json!("abc")])
            .unwrap_err();
        assert_eq!(errors.get("1"), Some(&["Not a valid integer.".to_string()][..]));
        assert!(errors.get("0").is_none());
    }

    #[test]
    fn test_positional_rejects_wrong_arity() {
        let errors = add_schema().positional().validate(&[json!(2)]).unwrap_err();
        assert_eq!(
            errors.get(ValidationErrors::SCHEMA),
            Some(&["Expected 2 positional parameters, got 1.".to_string()][..])
        );

        let errors = add_schema()
            .positional()
            .validate(&[json!(1), json!(2), json!(3)])
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_named_orders_by_declaration() {
        let mut map = Map::new();
        map.insert("b".to_string(), json!(3));
        map.insert("a".to_string(), json!(2));
        let values = add_schema().named().validate(&map).unwrap();
        assert_eq!(values, vec![json!(2), json!(3)]);
    }

    #[test]
    fn test_named_reports_missing_unknown_and_type() {
        let mut map = Map::new();
        map.insert("a".to_string(), json!("two"));
        map.insert("c".to_string(), json!(1));
        let errors = add_schema().named().validate(&map).unwrap_err();

        assert_eq!(errors.get("a"), Some(&["Not a valid integer.".to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[MISSING_FIELD.to_string()][..]));
        assert_eq!(errors.get("c"), Some(&[UNKNOWN_FIELD.to_string()][..]));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = ParamsSchema::new("f", vec![ParamSpec::string("x"), ParamSpec::integer("x")])
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateParam {
                method: "f".to_string(),
                param: "x".to_string()
            }
        );
    }

    #[test]
    fn test_names_and_types_arity() {
        let err = ParamsSchema::from_names_and_types("f", &["a"], vec![ParamType::Integer, ParamType::Boolean])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::ArityMismatch { expected: 2, given: 1, .. }));
    }

    #[test]
    fn test_empty_schema() {
        let schema = ParamsSchema::empty();
        assert!(schema.is_empty());
        assert!(schema.positional().validate(&[]).unwrap().is_empty());
        assert!(schema.named().validate(&Map::new()).unwrap().is_empty());
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = ParamsSchema::new(
            "greet",
            vec![ParamSpec::string("name"), ParamSpec::boolean("loud")],
        )
        .unwrap();

        assert_eq!(
            schema.to_json_schema(),
            json!({
                "oneOf": [
                    {
                        "type": "array",
                        "prefixItems": [{"type": "string"}, {"type": "boolean"}],
                        "minItems": 2,
                        "maxItems": 2
                    },
                    {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "loud": {"type": "boolean"}
                        },
                        "required": ["name", "loud"],
                        "additionalProperties": false
                    }
                ]
            })
        );
    }
}

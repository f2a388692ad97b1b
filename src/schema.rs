//! Data-shape descriptors for structured model output
//!
//! A [`Shape`] describes what a model response must look like. The same
//! descriptor is rendered to JSON Schema for the request and checked
//! against the parsed response afterwards.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// A response that does not match the requested shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema violation at {path}: expected {expected}, found {found}")]
pub struct SchemaViolation {
    pub path: String,
    pub expected: String,
    pub found: String,
}

/// Expected shape of a JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    String,
    /// A string that is not blank after trimming
    NonEmptyString,
    Integer { minimum: Option<i64> },
    Number,
    Boolean,
    Array(Box<Shape>),
    Object(Vec<Field>),
}

/// Named member of an object shape
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
    pub description: Option<String>,
}

impl Field {
    pub fn required(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: false,
            description: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Named shape sent along with a generate request
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub shape: Shape,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

impl Shape {
    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Object(fields.into_iter().collect())
    }

    pub fn array_of(item: Shape) -> Self {
        Shape::Array(Box::new(item))
    }

    #[must_use]
    pub fn positive_integer() -> Self {
        Shape::Integer { minimum: Some(1) }
    }

    /// Render as a JSON Schema document
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        match self {
            Shape::String => json!({ "type": "string" }),
            Shape::NonEmptyString => json!({ "type": "string", "minLength": 1 }),
            Shape::Integer { minimum } => match minimum {
                Some(min) => json!({ "type": "integer", "minimum": min }),
                None => json!({ "type": "integer" }),
            },
            Shape::Number => json!({ "type": "number" }),
            Shape::Boolean => json!({ "type": "boolean" }),
            Shape::Array(item) => json!({ "type": "array", "items": item.to_json_schema() }),
            Shape::Object(fields) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in fields {
                    let mut schema = field.shape.to_json_schema();
                    if let (Some(description), Some(obj)) =
                        (&field.description, schema.as_object_mut())
                    {
                        obj.insert("description".to_string(), json!(description));
                    }
                    properties.insert(field.name.clone(), schema);
                    if field.required {
                        required.push(json!(field.name));
                    }
                }
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })
            }
        }
    }

    /// Check `value` against this shape
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at("$", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<(), SchemaViolation> {
        match (self, value) {
            (Shape::String, Value::String(_)) => Ok(()),
            (Shape::NonEmptyString, Value::String(s)) if !s.trim().is_empty() => Ok(()),
            (Shape::NonEmptyString, Value::String(_)) => {
                Err(violation(path, "non-empty string", "blank string"))
            }
            (Shape::Integer { minimum }, Value::Number(n)) => {
                let Some(int) = n.as_i64() else {
                    return Err(violation(path, "integer", &n.to_string()));
                };
                match minimum {
                    Some(min) if int < *min => {
                        Err(violation(path, &format!("integer >= {min}"), &int.to_string()))
                    }
                    _ => Ok(()),
                }
            }
            (Shape::Number, Value::Number(_)) => Ok(()),
            (Shape::Boolean, Value::Bool(_)) => Ok(()),
            (Shape::Array(item), Value::Array(values)) => {
                for (idx, element) in values.iter().enumerate() {
                    item.validate_at(&format!("{path}[{idx}]"), element)?;
                }
                Ok(())
            }
            (Shape::Object(fields), Value::Object(members)) => {
                for field in fields {
                    let child = format!("{path}.{}", field.name);
                    match members.get(&field.name) {
                        Some(Value::Null) | None if field.required => {
                            return Err(violation(&child, &field.shape.type_name(), "missing"));
                        }
                        Some(Value::Null) | None => {}
                        Some(member) => field.shape.validate_at(&child, member)?,
                    }
                }
                Ok(())
            }
            (shape, other) => Err(violation(path, &shape.type_name(), json_type_name(other))),
        }
    }

    fn type_name(&self) -> String {
        match self {
            Shape::String => "string".to_string(),
            Shape::NonEmptyString => "non-empty string".to_string(),
            Shape::Integer { .. } => "integer".to_string(),
            Shape::Number => "number".to_string(),
            Shape::Boolean => "boolean".to_string(),
            Shape::Array(_) => "array".to_string(),
            Shape::Object(_) => "object".to_string(),
        }
    }
}

fn violation(path: &str, expected: &str, found: &str) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Tool trait and example-derived input schemas
//!
//! Every tool publishes an example input as JSON text. The input schema is
//! inferred from that example: an object whose keys are all required, each
//! typed by the example value.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::Result;

/// JSON type of a tool input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// Parses a JSON-schema type name
impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

impl FieldType {

    /// Infer the type of an example value
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
            Value::String(_) | Value::Null => Self::String,
        }
    }

    /// Type declared by a property schema, defaulting to string
    pub fn of_property(schema: &Value) -> Self {
        schema
            .get("type")
            .and_then(Value::as_str)
            .and_then(|name| name.parse().ok())
            .unwrap_or(Self::String)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` satisfies this type. Integers satisfy `number`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// A named capability the agent can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name (e.g., "calculator")
    fn name(&self) -> &str;

    /// Human-readable description for the LLM
    fn description(&self) -> &str;

    /// Example input as JSON text, optionally prefixed with `Example:`
    fn example_usage(&self) -> &str;

    /// Input schema derived from the example
    fn example_schema(&self) -> Value {
        schema_from_example(self.example_usage())
    }

    /// Execute with an input object
    async fn run(&self, input: &Value) -> Result<String>;
}

/// Infer an input schema from example JSON text.
///
/// Falls back to `{"type": "object"}` when the example is not a JSON object.
pub fn schema_from_example(example: &str) -> Value {
    let trimmed = example.trim();
    let body = trimmed.strip_prefix("Example:").unwrap_or(trimmed).trim();

    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return json!({"type": "object"});
    };

    let mut properties = Map::new();
    for (name, value) in &fields {
        properties.insert(name.clone(), json!({"type": FieldType::of_value(value).as_str()}));
    }
    let required: Vec<&String> = fields.keys().collect();

    json!({
        "type": "object",
        "required": required,
        "properties": properties
    })
}

/// Names listed under `required` in a schema
pub fn required_fields(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

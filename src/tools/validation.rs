//! Validate tool call arguments against a declared parameter schema.

use thiserror::Error;

use super::types::ToolParameters;

/// First schema violation found in a set of arguments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected object arguments, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' expected type '{expected}', got {actual}")]
    WrongType {
        field: String,
        expected: String,
        actual: &'static str,
    },
}

/// Top-level validation: object shape, required fields present, and each
/// declared property carries the declared JSON type. Extra fields pass.
pub fn validate_arguments(
    args: &serde_json::Value,
    parameters: &ToolParameters,
) -> Result<(), ValidationError> {
    let schema = &parameters.schema;
    let expects_object = schema.get("type").and_then(|v| v.as_str()) == Some("object");

    let Some(obj) = args.as_object() else {
        if expects_object {
            return Err(ValidationError::NotAnObject(json_type_name(args)));
        }
        return Ok(());
    };

    for name in parameters.required() {
        if !obj.contains_key(name) {
            return Err(ValidationError::MissingField(name.to_string()));
        }
    }

    let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) else {
        return Ok(());
    };
    for (key, value) in obj {
        let expected = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str());
        if let Some(expected) = expected {
            if !value_matches_type(value, expected) {
                return Err(ValidationError::WrongType {
                    field: key.clone(),
                    expected: expected.to_string(),
                    actual: json_type_name(value),
                });
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

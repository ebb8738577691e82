//! Typed access to tool call arguments.

use crate::error::CourierError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Normalize a raw payload from the model.
    ///
    /// A string payload is the model's argument text that did not decode on
    /// the wire; it gets one more parse attempt here and fails as an
    /// invalid argument. An empty string means "no arguments".
    pub fn parse(raw: &serde_json::Value) -> Result<Self, CourierError> {
        let value = match raw {
            serde_json::Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(trimmed).map_err(|e| {
                        CourierError::InvalidArgument(format!("arguments are not valid JSON: {e}"))
                    })?
                }
            }
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        Ok(Self { value })
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, CourierError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| CourierError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Deserialize the arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, CourierError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            CourierError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_decodes_string_payloads() {
        let args = ToolArguments::parse(&json!("{\"location\":\"Tokyo\"}")).unwrap();
        assert_eq!(args.get_str("location").unwrap(), "Tokyo");
    }

    #[test]
    fn parse_rejects_undecodable_strings() {
        let err = ToolArguments::parse(&json!("{\"location\":")).unwrap_err();
        assert!(matches!(err, CourierError::InvalidArgument(ref m) if m.contains("not valid JSON")));
    }

    #[test]
    fn parse_treats_empty_and_null_as_no_arguments() {
        assert_eq!(ToolArguments::parse(&json!("  ")).unwrap().raw(), &json!({}));
        assert_eq!(ToolArguments::parse(&serde_json::Value::Null).unwrap().raw(), &json!({}));
    }

    #[test]
    fn get_str_reports_missing_key() {
        let args = ToolArguments::new(json!({ "subject": "Hi" }));
        assert_eq!(args.get_str_opt("subject"), Some("Hi"));
        assert!(args.get_str("body").is_err());
    }
}

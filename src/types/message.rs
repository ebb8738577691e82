//! Message types for model communication.

use serde::{Deserialize, Serialize};
use strum::Display;

/// A message in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ModelMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    /// Content may be absent when the model only requested tool calls.
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool(ToolCallResult),
}

impl ModelMessage {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: text.into(),
        }
    }

    /// Create a text-only assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message carrying tool-call requests.
    pub fn assistant_with_tool_calls(
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self::Assistant {
            content,
            tool_calls,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(result: ToolCallResult) -> Self {
        Self::Tool(result)
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool(_) => Role::Tool,
        }
    }

    /// Text content, if the message has any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } => Some(content),
            Self::Assistant { content, .. } => content.as_deref(),
            Self::Tool(_) => None,
        }
    }

    /// Tool calls requested by this message (empty for non-assistant messages).
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// The tool result carried by a tool message.
    pub fn as_tool_result(&self) -> Option<&ToolCallResult> {
        match self {
            Self::Tool(result) => Some(result),
            _ => None,
        }
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    /// Opaque identifier assigned by the model service.
    pub id: String,
    pub name: String,
    /// Parsed arguments. Payloads that were not valid JSON on the wire are
    /// kept as a raw string so the invoker can report them.
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build from the wire form, where arguments arrive as a JSON string.
    pub fn from_wire(id: String, name: String, raw_arguments: String) -> Self {
        let arguments = serde_json::from_str(&raw_arguments)
            .unwrap_or(serde_json::Value::String(raw_arguments));
        Self {
            id,
            name,
            arguments,
        }
    }
}

/// The result of acting on one tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub name: String,
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    pub fn success(call: &ToolCallRequest, data: serde_json::Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            outcome: ToolOutcome::Success(data),
        }
    }

    pub fn failure(call: &ToolCallRequest, error: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            outcome: ToolOutcome::Failure(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Failure(_))
    }

    /// Payload handed back to the model, as a JSON string.
    pub fn content(&self) -> String {
        serde_json::to_string(&self.outcome).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    }
}

/// Discriminated tool outcome, serialized as
/// `{"ok": true, "data": ...}` or `{"ok": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(into = "OutcomeEnvelope", try_from = "OutcomeEnvelope")]
pub enum ToolOutcome {
    Success(serde_json::Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeEnvelope {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ToolOutcome> for OutcomeEnvelope {
    fn from(outcome: ToolOutcome) -> Self {
        match outcome {
            ToolOutcome::Success(data) => Self {
                ok: true,
                data: Some(data),
                error: None,
            },
            ToolOutcome::Failure(error) => Self {
                ok: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<OutcomeEnvelope> for ToolOutcome {
    type Error = String;

    fn try_from(envelope: OutcomeEnvelope) -> Result<Self, Self::Error> {
        if envelope.ok {
            Ok(Self::Success(envelope.data.unwrap_or(serde_json::Value::Null)))
        } else {
            envelope
                .error
                .map(Self::Failure)
                .ok_or_else(|| "failed outcome without an error message".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_serializes_as_discriminated_envelope() {
        let ok = ToolOutcome::Success(json!({ "status": "sent" }));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "ok": true, "data": { "status": "sent" } })
        );

        let err = ToolOutcome::Failure("mailbox full".into());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "ok": false, "error": "mailbox full" })
        );
    }

    #[test]
    fn failed_envelope_without_error_is_rejected() {
        let parsed = serde_json::from_value::<ToolOutcome>(json!({ "ok": false }));
        assert!(parsed.is_err());
    }

    #[test]
    fn wire_arguments_fall_back_to_raw_string() {
        let call = ToolCallRequest::from_wire("call_1".into(), "send_email".into(), "{not json".into());
        assert_eq!(call.arguments, json!("{not json"));

        let call = ToolCallRequest::from_wire("call_2".into(), "send_email".into(), "{\"a\":1}".into());
        assert_eq!(call.arguments, json!({ "a": 1 }));
    }

    #[test]
    fn messages_are_tagged_by_role() {
        let msg = ModelMessage::assistant_with_tool_calls(
            None,
            vec![ToolCallRequest::new("call_1", "get_current_time", json!({}))],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert!(value.get("content").is_none());
        assert_eq!(value["tool_calls"][0]["id"], "call_1");
        assert_eq!(msg.role(), Role::Assistant);
        assert_eq!(msg.tool_calls().len(), 1);
    }

    #[test]
    fn tool_message_exposes_result() {
        let call = ToolCallRequest::new("call_9", "send_email", json!({}));
        let msg = ModelMessage::tool_result(ToolCallResult::failure(&call, "nope"));
        let result = msg.as_tool_result().expect("tool result");
        assert!(result.is_error());
        assert_eq!(result.content(), r#"{"ok":false,"error":"nope"}"#);
        assert_eq!(msg.text(), None);
    }
}

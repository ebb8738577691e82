//! Append-only conversation transcript for one exchange.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CourierError;
use crate::types::{ModelMessage, ToolCallResult};

/// Ordered message history sent to the model on every call.
///
/// Insertion order is causal order. Tool results can only be appended as a
/// batch answering the assistant message right before them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ModelMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a transcript. Seed messages may not contain tool results.
    pub fn from_messages(messages: Vec<ModelMessage>) -> Result<Self, CourierError> {
        if messages.iter().any(|m| matches!(m, ModelMessage::Tool(_))) {
            return Err(CourierError::InvalidState(
                "tool results cannot seed a transcript".into(),
            ));
        }
        Ok(Self { messages })
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ModelMessage::user(text));
    }

    /// Append an assistant turn, tool calls kept in the order given.
    pub fn push_assistant(&mut self, message: ModelMessage) -> Result<(), CourierError> {
        if !matches!(message, ModelMessage::Assistant { .. }) {
            return Err(CourierError::InvalidState(format!(
                "expected an assistant message, got {}",
                message.role()
            )));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Append one tool message per result.
    ///
    /// The results must answer the immediately preceding assistant message:
    /// same identifiers, same order, none missing, none extra.
    pub fn append_tool_results(&mut self, results: Vec<ToolCallResult>) -> Result<(), CourierError> {
        let Some(ModelMessage::Assistant { tool_calls, .. }) = self.messages.last() else {
            return if results.is_empty() {
                Ok(())
            } else {
                Err(CourierError::InvalidState(
                    "tool results must follow an assistant message".into(),
                ))
            };
        };

        let expected: Vec<&str> = tool_calls.iter().map(|c| c.id.as_str()).collect();
        let actual: Vec<&str> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        if expected != actual {
            return Err(CourierError::InvalidState(format!(
                "tool results {actual:?} do not answer tool calls {expected:?}"
            )));
        }

        self.messages
            .extend(results.into_iter().map(ModelMessage::tool_result));
        Ok(())
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ModelMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    /// All tool results, in transcript order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolCallResult> {
        self.messages.iter().filter_map(ModelMessage::as_tool_result)
    }

    /// Check the pairing invariant across the whole transcript: every run of
    /// tool messages answers exactly the calls of the assistant message before it.
    pub fn verify(&self) -> Result<(), CourierError> {
        let mut pending: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for message in &self.messages {
            match message {
                ModelMessage::Tool(result) => {
                    if pending.first() != Some(&result.tool_call_id.as_str()) {
                        return Err(CourierError::InvalidState(format!(
                            "unexpected tool result '{}'",
                            result.tool_call_id
                        )));
                    }
                    pending.remove(0);
                }
                other => {
                    if let Some(missing) = pending.first() {
                        return Err(CourierError::InvalidState(format!(
                            "tool call '{missing}' has no result"
                        )));
                    }
                    seen.clear();
                    for call in other.tool_calls() {
                        if !seen.insert(call.id.as_str()) {
                            return Err(CourierError::InvalidState(format!(
                                "duplicate tool call id '{}'",
                                call.id
                            )));
                        }
                    }
                    pending = other.tool_calls().iter().map(|c| c.id.as_str()).collect();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallRequest;
    use serde_json::json;

    fn call(id: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, "get_current_time", json!({ "location": "Paris" }))
    }

    fn with_calls(ids: &[&str]) -> Transcript {
        let mut transcript = Transcript::from_messages(vec![ModelMessage::user("time?")]).unwrap();
        transcript
            .push_assistant(ModelMessage::assistant_with_tool_calls(
                None,
                ids.iter().map(|id| call(id)).collect(),
            ))
            .unwrap();
        transcript
    }

    #[test]
    fn results_must_match_calls_in_order() {
        let mut transcript = with_calls(&["a", "b"]);
        let swapped = vec![
            ToolCallResult::success(&call("b"), json!(1)),
            ToolCallResult::success(&call("a"), json!(2)),
        ];
        assert!(transcript.append_tool_results(swapped).is_err());

        let missing = vec![ToolCallResult::success(&call("a"), json!(1))];
        assert!(transcript.append_tool_results(missing).is_err());
        assert_eq!(transcript.len(), 2);

        let ordered = vec![
            ToolCallResult::success(&call("a"), json!(1)),
            ToolCallResult::failure(&call("b"), "nope"),
        ];
        transcript.append_tool_results(ordered).unwrap();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.tool_results().count(), 2);
        transcript.verify().unwrap();
    }

    #[test]
    fn empty_batch_after_plain_answer_is_a_no_op() {
        let mut transcript = with_calls(&[]);
        transcript.append_tool_results(Vec::new()).unwrap();
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn results_without_assistant_are_rejected() {
        let mut transcript = Transcript::new();
        transcript.push_user("hello");
        let err = transcript
            .append_tool_results(vec![ToolCallResult::success(&call("a"), json!(1))])
            .unwrap_err();
        assert!(matches!(err, CourierError::InvalidState(_)));
    }

    #[test]
    fn seeding_with_tool_results_is_rejected() {
        let seed = vec![ModelMessage::tool_result(ToolCallResult::success(&call("x"), json!(1)))];
        assert!(Transcript::from_messages(seed).is_err());
    }

    #[test]
    fn push_assistant_rejects_other_roles() {
        let mut transcript = Transcript::new();
        assert!(transcript.push_assistant(ModelMessage::user("hi")).is_err());
    }

    #[test]
    fn verify_flags_unanswered_calls() {
        let mut transcript = with_calls(&["a"]);
        transcript.push_user("still there?");
        assert!(transcript.verify().is_err());
    }
}

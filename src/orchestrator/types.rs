//! Exchange state and outcome types.

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::conversation::Transcript;
use crate::types::{FinishReason, ToolCallResult, Usage};

/// Unique exchange identifier.
pub type ExchangeId = Uuid;

/// Where an exchange is in its two-call cycle.
///
/// Transitions only move forward:
/// `Init -> AwaitingFirstResponse -> DispatchingTools -> AwaitingFinalResponse -> Done`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExchangeState {
    Init,
    AwaitingFirstResponse,
    DispatchingTools,
    AwaitingFinalResponse,
    Done,
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: ExchangeState) -> bool {
        use ExchangeState::*;
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Init, AwaitingFirstResponse)
                | (AwaitingFirstResponse, DispatchingTools)
                | (DispatchingTools, AwaitingFinalResponse)
                | (DispatchingTools, Done)
                | (AwaitingFinalResponse, Done)
        )
    }
}

/// Per-exchange behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOptions {
    /// Return the first response as the answer when it requested no tools,
    /// skipping the tool-less final call. Off by default.
    pub return_first_when_no_tools: bool,
}

/// Result of a completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub exchange_id: ExchangeId,
    /// Final assistant text; empty when the model returned no content.
    pub text: String,
    pub transcript: Transcript,
    /// Tool results in the order the model requested the calls.
    pub tool_results: Vec<ToolCallResult>,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    pub model_calls: u32,
    pub state: ExchangeState,
}

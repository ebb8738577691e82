//! Exchange event stream types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ModelMessage, ToolCallRequest, ToolCallResult};

use super::types::{ExchangeId, ExchangeState};

/// Callback receiving exchange events as they happen.
pub type ExchangeEventSink = Arc<dyn Fn(ExchangeEvent) + Send + Sync>;

/// Concrete event payloads emitted by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEventPayload {
    StateChanged {
        from: ExchangeState,
        to: ExchangeState,
    },
    AssistantMessage {
        message: ModelMessage,
    },
    ToolCallStarted {
        call: ToolCallRequest,
    },
    ToolResult {
        result: ToolCallResult,
    },
    Completed {
        text: String,
    },
    Failed {
        error: String,
    },
}

/// Envelope for exchange events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeEvent {
    pub exchange_id: ExchangeId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: ExchangeEventPayload,
}

pub(crate) struct ExchangeEventEmitter {
    exchange_id: ExchangeId,
    seq: AtomicU64,
    sink: Option<ExchangeEventSink>,
}

impl ExchangeEventEmitter {
    pub(crate) fn new(exchange_id: ExchangeId, sink: Option<ExchangeEventSink>) -> Self {
        Self {
            exchange_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: ExchangeEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(ExchangeEvent {
            exchange_id: self.exchange_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}

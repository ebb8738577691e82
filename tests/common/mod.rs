//! Shared test helpers and scripted mock provider.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use courier::error::CourierError;
use courier::orchestrator::{ExchangeEvent, ExchangeEventSink};
use courier::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use courier::types::*;

/// A provider that replays queued responses and records every request.
pub struct ScriptedProvider {
    model_id: String,
    responses: Mutex<Vec<Result<ProviderResponse, CourierError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text response.
    pub fn queue_text(&self, text: &str) {
        self.responses.lock().unwrap().push(Ok(ProviderResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            finish_reason: Some(FinishReason::Stop),
        }));
    }

    /// Queue a response requesting the given tool calls, in order.
    pub fn queue_tool_calls(&self, calls: Vec<ToolCallRequest>) {
        self.responses.lock().unwrap().push(Ok(ProviderResponse {
            content: None,
            tool_calls: calls,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: Some(FinishReason::ToolCalls),
        }));
    }

    pub fn queue_response(&self, response: ProviderResponse) {
        self.responses.lock().unwrap().push(Ok(response));
    }

    pub fn queue_error(&self, error: CourierError) {
        self.responses.lock().unwrap().push(Err(error));
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, CourierError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ProviderResponse::text("Mock response"));
        }
        responses.remove(0)
    }
}

pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(id, name, arguments)
}

/// An event sink that collects events for later inspection.
pub fn collecting_sink() -> (ExchangeEventSink, Arc<Mutex<Vec<ExchangeEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: ExchangeEventSink = Arc::new(move |event| captured.lock().unwrap().push(event));
    (sink, events)
}

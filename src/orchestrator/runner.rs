//! The exchange runner.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::action::ActionInvoker;
use crate::conversation::Transcript;
use crate::error::CourierError;
use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use crate::tools::ToolRegistry;
use crate::types::{GenerationSettings, ModelMessage, ToolCallRequest, ToolCallResult, ToolChoice, Usage};
use crate::util::retry::RetryPolicy;

use super::events::{ExchangeEventEmitter, ExchangeEventPayload, ExchangeEventSink};
use super::types::{ExchangeId, ExchangeOptions, ExchangeOutcome, ExchangeState};

/// Drives one prompt through the two-call tool cycle.
///
/// Holds no per-exchange state, so a single orchestrator can serve
/// concurrent exchanges.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    invoker: ActionInvoker,
    settings: GenerationSettings,
    retry: RetryPolicy,
    options: ExchangeOptions,
    event_sink: Option<ExchangeEventSink>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            invoker: ActionInvoker::new(),
            settings: GenerationSettings::default(),
            retry: RetryPolicy::disabled(),
            options: ExchangeOptions::default(),
            event_sink: None,
        }
    }

    pub fn with_invoker(mut self, invoker: ActionInvoker) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Retry policy for model calls. Tool calls are never retried.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_options(mut self, options: ExchangeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_event_sink(mut self, sink: ExchangeEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &dyn ModelProvider {
        self.provider.as_ref()
    }

    /// Run one exchange starting from a single user prompt.
    pub async fn run_conversation(
        &self,
        prompt: impl Into<String>,
    ) -> Result<ExchangeOutcome, CourierError> {
        self.run(vec![ModelMessage::user(prompt)]).await
    }

    /// Run one exchange from seed messages (system and user turns).
    ///
    /// Model-service failures end the exchange in [`ExchangeState::Failed`]
    /// and are returned as errors. Tool failures never are: they reach the
    /// model as error results.
    pub async fn run(&self, messages: Vec<ModelMessage>) -> Result<ExchangeOutcome, CourierError> {
        if !messages.iter().any(|m| matches!(m, ModelMessage::User { .. })) {
            return Err(CourierError::InvalidArgument(
                "an exchange needs at least one user message".into(),
            ));
        }
        let transcript = Transcript::from_messages(messages)?;
        let exchange_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "exchange",
            %exchange_id,
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
        );
        self.drive(exchange_id, transcript).instrument(span).await
    }

    async fn drive(
        &self,
        exchange_id: ExchangeId,
        transcript: Transcript,
    ) -> Result<ExchangeOutcome, CourierError> {
        let mut exchange = Exchange::new(exchange_id, self.event_sink.clone());
        match self.cycle(&mut exchange, transcript).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => Err(exchange.fail(err)),
        }
    }

    async fn cycle(
        &self,
        exchange: &mut Exchange,
        mut transcript: Transcript,
    ) -> Result<ExchangeOutcome, CourierError> {
        let mut usage = Usage::default();
        info!("exchange started");

        exchange.advance(ExchangeState::AwaitingFirstResponse)?;
        let declarations = self.registry.declarations();
        let first_request = ProviderRequest {
            messages: transcript.messages().to_vec(),
            settings: self.settings.clone(),
            tools: (!declarations.is_empty()).then_some(declarations),
            tool_choice: Some(ToolChoice::Auto),
        };
        let first = self.call_model(&first_request).await?;
        usage.merge(&first.usage);

        let calls = unique_calls(&first.tool_calls);
        let assistant = ModelMessage::assistant_with_tool_calls(first.content.clone(), calls.clone());
        transcript.push_assistant(assistant.clone())?;
        exchange.emit(ExchangeEventPayload::AssistantMessage { message: assistant });

        exchange.advance(ExchangeState::DispatchingTools)?;
        let tool_results = self.dispatch(&calls, exchange).await;
        transcript.append_tool_results(tool_results.clone())?;

        if calls.is_empty() && self.options.return_first_when_no_tools {
            info!("no tool calls requested; returning first response");
            exchange.advance(ExchangeState::Done)?;
            let text = first.content.clone().unwrap_or_default();
            exchange.emit(ExchangeEventPayload::Completed { text: text.clone() });
            return Ok(ExchangeOutcome {
                exchange_id: exchange.id,
                text,
                transcript,
                tool_results,
                usage,
                finish_reason: first.finish_reason,
                model_calls: 1,
                state: exchange.state,
            });
        }

        exchange.advance(ExchangeState::AwaitingFinalResponse)?;
        let final_request = ProviderRequest {
            messages: transcript.messages().to_vec(),
            settings: self.settings.clone(),
            tools: None,
            tool_choice: None,
        };
        let last = self.call_model(&final_request).await?;
        usage.merge(&last.usage);

        if !last.tool_calls.is_empty() {
            warn!(
                ignored = last.tool_calls.len(),
                "final response requested tools; ignoring them"
            );
        }
        let text = last.content.clone().unwrap_or_default();
        let closing = ModelMessage::assistant_with_tool_calls(last.content.clone(), Vec::new());
        transcript.push_assistant(closing.clone())?;
        exchange.emit(ExchangeEventPayload::AssistantMessage { message: closing });

        exchange.advance(ExchangeState::Done)?;
        exchange.emit(ExchangeEventPayload::Completed { text: text.clone() });
        info!(
            tool_calls = tool_results.len(),
            total_tokens = usage.total_tokens,
            "exchange completed"
        );

        Ok(ExchangeOutcome {
            exchange_id: exchange.id,
            text,
            transcript,
            tool_results,
            usage,
            finish_reason: last.finish_reason,
            model_calls: 2,
            state: exchange.state,
        })
    }

    async fn call_model(&self, request: &ProviderRequest) -> Result<ProviderResponse, CourierError> {
        self.retry.execute(|| self.provider.complete(request)).await
    }

    /// Dispatch a batch concurrently. Results come back in request order.
    async fn dispatch(&self, calls: &[ToolCallRequest], exchange: &Exchange) -> Vec<ToolCallResult> {
        if calls.is_empty() {
            return Vec::new();
        }
        debug!(count = calls.len(), "dispatching tool calls");
        join_all(calls.iter().map(|call| self.dispatch_one(call, exchange))).await
    }

    async fn dispatch_one(&self, call: &ToolCallRequest, exchange: &Exchange) -> ToolCallResult {
        exchange.emit(ExchangeEventPayload::ToolCallStarted { call: call.clone() });

        let result = match self.registry.resolve(&call.name) {
            Ok((declaration, handler)) => self.invoker.invoke(declaration, handler, call).await,
            Err(err) => {
                warn!(tool = %call.name, call_id = %call.id, "model requested an unknown tool");
                ToolCallResult::failure(call, err.tool_message())
            }
        };

        exchange.emit(ExchangeEventPayload::ToolResult { result: result.clone() });
        result
    }
}

/// Keep the first request per call identifier; each id is dispatched once
/// and answered by exactly one result.
fn unique_calls(calls: &[ToolCallRequest]) -> Vec<ToolCallRequest> {
    let mut seen = HashSet::new();
    calls
        .iter()
        .filter(|call| {
            let first_use = seen.insert(call.id.as_str());
            if !first_use {
                warn!(call_id = %call.id, tool = %call.name, "dropping repeated tool call id");
            }
            first_use
        })
        .cloned()
        .collect()
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("registry", &self.registry)
            .field("invoker", &self.invoker)
            .field("options", &self.options)
            .finish()
    }
}

/// Per-exchange state machine plus its event emitter.
struct Exchange {
    id: ExchangeId,
    state: ExchangeState,
    emitter: ExchangeEventEmitter,
}

impl Exchange {
    fn new(exchange_id: ExchangeId, sink: Option<ExchangeEventSink>) -> Self {
        Self {
            id: exchange_id,
            state: ExchangeState::Init,
            emitter: ExchangeEventEmitter::new(exchange_id, sink),
        }
    }

    fn emit(&self, payload: ExchangeEventPayload) {
        self.emitter.emit(payload);
    }

    fn advance(&mut self, next: ExchangeState) -> Result<(), CourierError> {
        let from = self.state;
        if !from.can_transition_to(next) {
            return Err(CourierError::InvalidState(format!(
                "illegal exchange transition {from} -> {next}"
            )));
        }
        debug!(%from, to = %next, "exchange state");
        self.state = next;
        self.emit(ExchangeEventPayload::StateChanged { from, to: next });
        Ok(())
    }

    /// Move to `Failed` and hand the error back for propagation.
    fn fail(&mut self, err: CourierError) -> CourierError {
        error!(state = %self.state, error = %err, "exchange failed");
        let from = self.state;
        if !from.can_transition_to(ExchangeState::Failed) {
            return err;
        }
        self.state = ExchangeState::Failed;
        self.emit(ExchangeEventPayload::StateChanged {
            from,
            to: ExchangeState::Failed,
        });
        self.emit(ExchangeEventPayload::Failed {
            error: err.to_string(),
        });
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::events::ExchangeEvent;
    use crate::tools::{ToolDeclaration, ToolParameters};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Canned(Mutex<Vec<ProviderResponse>>);

    #[async_trait]
    impl ModelProvider for Canned {
        fn provider_name(&self) -> &str {
            "canned"
        }

        fn model_id(&self) -> &str {
            "canned-1"
        }

        async fn complete(&self, _request: &ProviderRequest) -> Result<ProviderResponse, CourierError> {
            let mut queue = self.0.lock().unwrap();
            Ok(if queue.is_empty() {
                ProviderResponse::text("done")
            } else {
                queue.remove(0)
            })
        }
    }

    #[tokio::test]
    async fn duplicate_call_ids_are_dispatched_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(
                ToolDeclaration::new("ping", "Ping", ToolParameters::empty()),
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(json!("pong")) }
                },
            )
            .unwrap();

        let call = ToolCallRequest::new("same", "ping", json!({}));
        let provider = Canned(Mutex::new(vec![ProviderResponse::with_tool_calls(vec![
            call.clone(),
            call,
        ])]));
        let orchestrator = Orchestrator::new(Arc::new(provider), Arc::new(registry));

        let outcome = orchestrator.run_conversation("ping twice").await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.tool_results.len(), 1);
        assert!(!outcome.tool_results[0].is_error());
        outcome.transcript.verify().unwrap();
        match &outcome.transcript.messages()[1] {
            ModelMessage::Assistant { tool_calls, .. } => assert_eq!(tool_calls.len(), 1),
            other => panic!("expected assistant message, got {other:?}"),
        }
    }

    fn recording_exchange() -> (Exchange, Arc<Mutex<Vec<ExchangeEventPayload>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let sink: ExchangeEventSink = Arc::new(move |event: ExchangeEvent| {
            recorder.lock().unwrap().push(event.payload);
        });
        let exchange = Exchange::new(Uuid::new_v4(), Some(sink));
        (exchange, seen)
    }

    #[test]
    fn failure_mid_dispatch_ends_in_failed() {
        let (mut exchange, seen) = recording_exchange();
        exchange.advance(ExchangeState::AwaitingFirstResponse).unwrap();
        exchange.advance(ExchangeState::DispatchingTools).unwrap();

        let err = exchange.fail(CourierError::InvalidState("tool results out of order".into()));

        assert!(matches!(err, CourierError::InvalidState(_)));
        assert_eq!(exchange.state, ExchangeState::Failed);
        let seen = seen.lock().unwrap();
        assert!(matches!(
            seen[seen.len() - 2],
            ExchangeEventPayload::StateChanged {
                from: ExchangeState::DispatchingTools,
                to: ExchangeState::Failed,
            }
        ));
        assert!(matches!(&seen[seen.len() - 1], ExchangeEventPayload::Failed { error } if error.contains("out of order")));
    }

    #[test]
    fn illegal_transition_fails_the_exchange() {
        let (mut exchange, seen) = recording_exchange();
        let err = exchange.advance(ExchangeState::Done).unwrap_err();
        let err = exchange.fail(err);

        assert!(matches!(err, CourierError::InvalidState(_)));
        assert_eq!(exchange.state, ExchangeState::Failed);
        assert!(matches!(
            seen.lock().unwrap()[0],
            ExchangeEventPayload::StateChanged {
                from: ExchangeState::Init,
                to: ExchangeState::Failed,
            }
        ));
    }

    #[test]
    fn failing_a_finished_exchange_keeps_it_done() {
        let (mut exchange, seen) = recording_exchange();
        exchange.advance(ExchangeState::AwaitingFirstResponse).unwrap();
        exchange.advance(ExchangeState::DispatchingTools).unwrap();
        exchange.advance(ExchangeState::Done).unwrap();
        let before = seen.lock().unwrap().len();

        exchange.fail(CourierError::Timeout(1));

        assert_eq!(exchange.state, ExchangeState::Done);
        assert_eq!(seen.lock().unwrap().len(), before);
    }

    #[tokio::test]
    async fn exchange_requires_a_user_message() {
        let orchestrator = Orchestrator::new(
            Arc::new(Canned(Mutex::new(Vec::new()))),
            Arc::new(ToolRegistry::new()),
        );
        let err = orchestrator
            .run(vec![ModelMessage::system("be brief")])
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::InvalidArgument(_)));
    }
}

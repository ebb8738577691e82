//! Convenience re-exports for common use.

pub use crate::action::{ActionInvoker, CurrentTimeAction, EmailAction};
pub use crate::config::CourierConfig;
pub use crate::conversation::Transcript;
pub use crate::error::{CourierError, Result};
pub use crate::models::{ModelTarget, ProviderKey};
pub use crate::orchestrator::{
    ExchangeEvent, ExchangeEventPayload, ExchangeOptions, ExchangeOutcome, ExchangeState,
    Orchestrator,
};
pub use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
pub use crate::tools::{ToolArguments, ToolDeclaration, ToolHandler, ToolParameters, ToolRegistry};
pub use crate::types::{
    FinishReason, GenerationSettings, ModelMessage, Role, ToolCallRequest, ToolCallResult,
    ToolOutcome, Usage,
};

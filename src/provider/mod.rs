//! Model service trait and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "azure")]
pub mod azure;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CourierConfig;
use crate::error::CourierError;
use crate::models::{ModelTarget, ProviderKey};
use crate::tools::ToolDeclaration;
use crate::types::{FinishReason, GenerationSettings, ModelMessage, ToolCallRequest, ToolChoice, Usage};

/// A request sent to the model service.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    /// `None` means no tools are advertised on this call.
    pub tools: Option<Vec<ToolDeclaration>>,
    pub tool_choice: Option<ToolChoice>,
}

/// The assistant turn returned by the model service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some(FinishReason::Stop),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Self::default()
        }
    }

    /// The transcript entry for this response, tool calls in the order returned.
    pub fn to_message(&self) -> ModelMessage {
        ModelMessage::assistant_with_tool_calls(self.content.clone(), self.tool_calls.clone())
    }
}

/// Core trait implemented by every model service client.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai", "azure").
    fn provider_name(&self) -> &str;

    /// The model (or deployment) this provider instance serves.
    fn model_id(&self) -> &str;

    /// One non-streaming chat completion.
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, CourierError>;
}

/// Create a provider for the given target, using the provided config.
pub fn create_provider(
    target: &ModelTarget,
    config: &CourierConfig,
) -> Result<Arc<dyn ModelProvider>, CourierError> {
    match target.provider {
        #[cfg(feature = "openai")]
        ProviderKey::OpenAi => {
            let api_key = config
                .get_api_key("openai")
                .ok_or_else(|| CourierError::Authentication("Missing OPENAI_API_KEY".into()))?;
            Ok(Arc::new(openai::OpenAiProvider::new(
                target.model_id.clone(),
                &api_key,
                config.get_base_url("openai"),
            )?))
        }
        #[cfg(feature = "azure")]
        ProviderKey::Azure => {
            let api_key = config
                .get_api_key("azure")
                .ok_or_else(|| CourierError::Authentication("Missing AZURE_OPENAI_API_KEY".into()))?;
            let endpoint = config
                .get_base_url("azure")
                .ok_or_else(|| CourierError::Configuration("Missing AZURE_OPENAI_ENDPOINT".into()))?;
            Ok(Arc::new(azure::AzureOpenAiProvider::new(
                &endpoint,
                &target.model_id,
                &api_key,
                config.azure_api_version(),
            )?))
        }
        #[allow(unreachable_patterns)]
        _ => Err(CourierError::ModelNotFound(format!(
            "Provider for model '{target}' not enabled via feature flags"
        ))),
    }
}

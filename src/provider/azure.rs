//! Azure OpenAI provider.

use async_trait::async_trait;

use crate::error::CourierError;

use super::http::api_key_headers;
use super::openai::OpenAiProvider;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

/// Azure OpenAI Service provider (Chat Completions on a deployment).
pub struct AzureOpenAiProvider {
    inner: OpenAiProvider,
}

impl AzureOpenAiProvider {
    /// `endpoint`: e.g. "https://myresource.openai.azure.com"
    /// `deployment`: e.g. "gpt-4"
    /// `api_version`: e.g. "2024-08-01-preview"
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_key: &str,
        api_version: &str,
    ) -> Result<Self, CourierError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );
        Ok(Self {
            inner: OpenAiProvider::with_endpoint("azure", deployment, url, api_key_headers(api_key))?,
        })
    }
}

#[async_trait]
impl ModelProvider for AzureOpenAiProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, CourierError> {
        self.inner.complete(request).await
    }
}

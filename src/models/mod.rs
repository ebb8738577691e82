//! Model target selection (`provider:model`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CourierError;

/// Providers courier can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKey {
    OpenAi,
    Azure,
}

impl ProviderKey {
    /// Canonical provider key string, also used for config lookups.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        }
    }

    /// Parse user-facing provider aliases.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "azure" | "azure-openai" | "azure_openai" => Some(Self::Azure),
            _ => None,
        }
    }
}

/// A model to run an exchange against. For Azure the model id is the
/// deployment name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTarget {
    pub provider: ProviderKey,
    pub model_id: String,
}

impl ModelTarget {
    pub fn new(provider: ProviderKey, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
        }
    }
}

impl FromStr for ModelTarget {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            CourierError::Configuration(format!(
                "Invalid model format: '{s}'. Use provider:model (e.g. azure:gpt-4)"
            ))
        })?;
        let provider = ProviderKey::parse(provider)
            .ok_or_else(|| CourierError::ModelNotFound(format!("unknown provider '{provider}'")))?;
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(CourierError::Configuration(format!("Missing model id in '{s}'")));
        }
        Ok(Self::new(provider, model_id))
    }
}

impl fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.as_str(), self.model_id)
    }
}

//! Configuration (layered: code > env > config file).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::CourierError;

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";
pub const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4";

/// Layered configuration for courier.
///
/// Each layer only overrides what it sets. [`CourierConfig::load`] reads the
/// config file first, then environment variables; explicit setters win over
/// both.
#[derive(Clone, Default)]
pub struct CourierConfig {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
    azure_api_version: Option<String>,
    azure_deployment: Option<String>,
    email_endpoint: Option<String>,
    model: Option<String>,
    tool_timeout_ms: Option<u64>,
}

impl fmt::Debug for CourierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.api_keys.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("CourierConfig")
            .field("api_keys", &providers)
            .field("base_urls", &self.base_urls)
            .field("azure_api_version", &self.azure_api_version)
            .field("azure_deployment", &self.azure_deployment)
            .field("email_endpoint", &self.email_endpoint)
            .field("model", &self.model)
            .field("tool_timeout_ms", &self.tool_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    email_endpoint: Option<String>,
    tool_timeout_ms: Option<u64>,
    #[serde(default)]
    azure: AzureSection,
    #[serde(default)]
    openai: OpenAiSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AzureSection {
    endpoint: Option<String>,
    api_key: Option<String>,
    api_version: Option<String>,
    deployment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OpenAiSection {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl CourierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (after reading `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup using the environment variable names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        config.apply_lookup(lookup);
        config
    }

    fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let key_mappings = [("AZURE_OPENAI_API_KEY", "azure"), ("OPENAI_API_KEY", "openai")];
        for (var, provider) in key_mappings {
            if let Some(key) = lookup(var) {
                self.set_api_key(provider, key);
            }
        }

        let url_mappings = [("AZURE_OPENAI_ENDPOINT", "azure"), ("OPENAI_BASE_URL", "openai")];
        for (var, provider) in url_mappings {
            if let Some(url) = lookup(var) {
                self.set_base_url(provider, url);
            }
        }

        if let Some(v) = lookup("AZURE_OPENAI_API_VERSION") {
            self.azure_api_version = Some(v);
        }
        if let Some(v) = lookup("AZURE_OPENAI_DEPLOYMENT") {
            self.azure_deployment = Some(v);
        }
        if let Some(v) = lookup("AZURE_FUNCTION_URL") {
            self.email_endpoint = Some(v);
        }
        if let Some(v) = lookup("COURIER_MODEL") {
            self.model = Some(v);
        }
        match lookup("COURIER_TOOL_TIMEOUT_MS").map(|v| v.parse::<u64>()) {
            Some(Ok(ms)) => self.tool_timeout_ms = Some(ms),
            Some(Err(e)) => tracing::warn!(error = %e, "ignoring invalid COURIER_TOOL_TIMEOUT_MS"),
            None => {}
        }
    }

    /// Parse a TOML config document.
    pub fn from_toml_str(raw: &str) -> Result<Self, CourierError> {
        let file: FileConfig = toml::from_str(raw)?;
        let mut config = Self::new();
        if let Some(key) = file.azure.api_key {
            config.set_api_key("azure", key);
        }
        if let Some(url) = file.azure.endpoint {
            config.set_base_url("azure", url);
        }
        if let Some(key) = file.openai.api_key {
            config.set_api_key("openai", key);
        }
        if let Some(url) = file.openai.base_url {
            config.set_base_url("openai", url);
        }
        config.azure_api_version = file.azure.api_version;
        config.azure_deployment = file.azure.deployment;
        config.email_endpoint = file.email_endpoint;
        config.model = file.model;
        config.tool_timeout_ms = file.tool_timeout_ms;
        Ok(config)
    }

    /// Config file, then environment on top.
    ///
    /// With no explicit path the default location is used when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, CourierError> {
        let file_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };
        let mut config = match file_path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config file");
                Self::from_toml_str(&std::fs::read_to_string(&p)?)?
            }
            None => Self::new(),
        };
        let _ = dotenvy::dotenv();
        config.apply_lookup(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `<config dir>/courier/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "courier").map(|d| d.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, provider: &str, key: String) {
        self.api_keys.insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.get(provider).cloned()
    }

    pub fn set_base_url(&mut self, provider: &str, url: String) {
        self.base_urls.insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.get(provider).cloned()
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.api_keys.contains_key(provider)
    }

    pub fn azure_api_version(&self) -> &str {
        self.azure_api_version
            .as_deref()
            .unwrap_or(DEFAULT_AZURE_API_VERSION)
    }

    pub fn azure_deployment(&self) -> &str {
        self.azure_deployment
            .as_deref()
            .unwrap_or(DEFAULT_AZURE_DEPLOYMENT)
    }

    pub fn set_email_endpoint(&mut self, url: String) {
        self.email_endpoint = Some(url);
    }

    pub fn email_endpoint(&self) -> Option<&str> {
        self.email_endpoint.as_deref()
    }

    pub fn set_model(&mut self, model: String) {
        self.model = Some(model);
    }

    /// Model target string, e.g. `azure:gpt-4`. Defaults to the Azure deployment.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| format!("azure:{}", self.azure_deployment()))
    }

    pub fn set_tool_timeout(&mut self, timeout: Duration) {
        self.tool_timeout_ms = Some(timeout.as_millis() as u64);
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_ms.map(Duration::from_millis)
    }
}

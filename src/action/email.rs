//! `send_email` action backed by a remote HTTP endpoint.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CourierConfig;
use crate::error::CourierError;
use crate::tools::{ToolArguments, ToolDeclaration, ToolHandler, ToolParameters};

pub const SEND_EMAIL: &str = "send_email";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// JSON body posted to the email endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailRequest {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

impl EmailRequest {
    /// Local checks run before anything leaves the process.
    pub fn validate(&self) -> Result<(), CourierError> {
        if !address_pattern().is_match(self.to_email.trim()) {
            return Err(CourierError::InvalidArgument(format!(
                "'{}' is not a valid email address",
                self.to_email
            )));
        }
        Ok(())
    }
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid address regex"))
}

/// Sends mail by POSTing to a configured action endpoint.
///
/// A 200 response's JSON body is returned verbatim; any other status fails
/// with the response body as the message. No retries.
#[derive(Debug, Clone)]
pub struct EmailAction {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl EmailAction {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CourierError> {
        Ok(Self {
            endpoint: Some(endpoint.into()),
            client: build_client()?,
        })
    }

    /// An action with no endpoint; every send fails with a configuration message.
    pub fn unconfigured() -> Result<Self, CourierError> {
        Ok(Self {
            endpoint: None,
            client: build_client()?,
        })
    }

    pub fn from_config(config: &CourierConfig) -> Result<Self, CourierError> {
        match config.email_endpoint() {
            Some(endpoint) => Self::new(endpoint),
            None => {
                warn!("AZURE_FUNCTION_URL not set; send_email will report an error");
                Self::unconfigured()
            }
        }
    }

    pub fn declaration() -> ToolDeclaration {
        ToolDeclaration::new(
            SEND_EMAIL,
            "Sends an email.",
            ToolParameters::object()
                .string("to_email", "The recipient's email address", true)
                .string("subject", "The subject of the email", true)
                .string("body", "The body of the email", true)
                .build(),
        )
    }

    pub async fn send(&self, request: &EmailRequest) -> Result<serde_json::Value, CourierError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            CourierError::tool(SEND_EMAIL, "email endpoint is not configured (AZURE_FUNCTION_URL)")
        })?;

        debug!(to = %request.to_email, "posting email to action endpoint");
        let resp = self.client.post(endpoint).json(request).send().await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if status != 200 {
            warn!(status, "email endpoint rejected the request");
            return Err(CourierError::tool(SEND_EMAIL, body));
        }

        serde_json::from_str(&body).map_err(|e| {
            CourierError::tool(SEND_EMAIL, format!("endpoint returned invalid JSON: {e}"))
        })
    }
}

#[async_trait]
impl ToolHandler for EmailAction {
    async fn invoke(&self, args: &ToolArguments) -> Result<serde_json::Value, CourierError> {
        let request: EmailRequest = args.deserialize()?;
        request.validate()?;
        self.send(&request).await
    }
}

fn build_client() -> Result<reqwest::Client, CourierError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

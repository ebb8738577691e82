//! Executes one resolved tool call and normalizes its outcome.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::CourierError;
use crate::tools::validation::validate_arguments;
use crate::tools::{ToolArguments, ToolDeclaration, ToolHandler};
use crate::types::{ToolCallRequest, ToolCallResult};

/// Runs tool handlers behind a boundary that never fails: malformed
/// arguments, handler errors, panics, and timeouts all come back as a failed
/// [`ToolCallResult`].
#[derive(Debug, Clone, Default)]
pub struct ActionInvoker {
    timeout: Option<Duration>,
}

impl ActionInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each invocation; expiry becomes a failed result.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn invoke(
        &self,
        declaration: &ToolDeclaration,
        handler: &dyn ToolHandler,
        call: &ToolCallRequest,
    ) -> ToolCallResult {
        match self.try_invoke(declaration, handler, call).await {
            Ok(data) => {
                debug!(tool = %call.name, call_id = %call.id, "tool call succeeded");
                ToolCallResult::success(call, data)
            }
            Err(err) => {
                warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
                ToolCallResult::failure(call, err.tool_message())
            }
        }
    }

    async fn try_invoke(
        &self,
        declaration: &ToolDeclaration,
        handler: &dyn ToolHandler,
        call: &ToolCallRequest,
    ) -> Result<serde_json::Value, CourierError> {
        let args = ToolArguments::parse(&call.arguments)?;
        validate_arguments(args.raw(), &declaration.parameters)
            .map_err(|e| CourierError::InvalidArgument(e.to_string()))?;

        let call_handler = AssertUnwindSafe(handler.invoke(&args))
            .catch_unwind()
            .map(|outcome| {
                outcome.unwrap_or_else(|_| {
                    Err(CourierError::tool(&call.name, "tool handler panicked"))
                })
            });

        let Some(limit) = self.timeout else {
            return call_handler.await;
        };
        tokio::time::timeout(limit, call_handler)
            .await
            .unwrap_or_else(|_| {
                warn!(
                    tool = %call.name,
                    call_id = %call.id,
                    limit_ms = limit.as_millis() as u64,
                    "tool call timed out"
                );
                Err(CourierError::Timeout(limit.as_millis() as u64))
            })
    }
}

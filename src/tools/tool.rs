//! Tool handler trait and closure-based handler wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use crate::error::CourierError;

/// The single capability a registered tool exposes to the dispatcher.
///
/// Handlers receive arguments that already passed schema validation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, args: &ToolArguments) -> Result<serde_json::Value, CourierError>;
}

type BoxedHandlerFn = dyn Fn(ToolArguments) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, CourierError>> + Send>>
    + Send
    + Sync;

/// Closure-based handler for quick tool creation.
#[derive(Clone)]
pub struct FnHandler {
    handler: Arc<BoxedHandlerFn>,
}

impl FnHandler {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, CourierError>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl ToolHandler for FnHandler {
    async fn invoke(&self, args: &ToolArguments) -> Result<serde_json::Value, CourierError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fn_handler_forwards_arguments() {
        let handler = FnHandler::new(|args| async move {
            let name = args.get_str("name")?;
            Ok(serde_json::json!({ "greeting": format!("Hello, {name}!") }))
        });

        let out = handler
            .invoke(&ToolArguments::new(serde_json::json!({ "name": "Min" })))
            .await
            .unwrap();
        assert_eq!(out["greeting"], "Hello, Min!");
    }

    #[tokio::test]
    async fn fn_handler_propagates_errors() {
        let handler = FnHandler::new(|args| async move {
            args.get_str("missing")?;
            Ok(serde_json::Value::Null)
        });

        let err = handler
            .invoke(&ToolArguments::new(serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::InvalidArgument(_)));
    }
}

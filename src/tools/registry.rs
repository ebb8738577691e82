//! Name-keyed registry of tool declarations and their handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::tool::{FnHandler, ToolHandler};
use super::types::ToolDeclaration;
use crate::error::CourierError;

struct RegisteredTool {
    declaration: ToolDeclaration,
    handler: Arc<dyn ToolHandler>,
}

/// Maps tool names to declarations (advertised to the model) and handlers
/// (used for dispatch). Registration order is preserved.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails with [`CourierError::DuplicateTool`] if the name is taken.
    pub fn register(
        &mut self,
        declaration: ToolDeclaration,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), CourierError> {
        if self.index.contains_key(&declaration.name) {
            return Err(CourierError::DuplicateTool(declaration.name));
        }
        debug!(tool = %declaration.name, "registering tool");
        self.index.insert(declaration.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            declaration,
            handler,
        });
        Ok(())
    }

    /// Register a closure as a tool handler.
    pub fn register_fn<F, Fut>(
        &mut self,
        declaration: ToolDeclaration,
        handler: F,
    ) -> Result<(), CourierError>
    where
        F: Fn(super::ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<serde_json::Value, CourierError>> + Send + 'static,
    {
        self.register(declaration, Arc::new(FnHandler::new(handler)))
    }

    /// All declarations, in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|t| t.declaration.clone()).collect()
    }

    /// Declarations for the given names, in registration order. Unknown names are skipped.
    pub fn declarations_for(&self, names: &[&str]) -> Vec<ToolDeclaration> {
        self.tools
            .iter()
            .filter(|t| names.contains(&t.declaration.name.as_str()))
            .map(|t| t.declaration.clone())
            .collect()
    }

    pub fn declaration(&self, name: &str) -> Result<&ToolDeclaration, CourierError> {
        self.lookup(name).map(|t| &t.declaration)
    }

    /// Handler for a tool name, or [`CourierError::UnknownTool`].
    pub fn handler_for(&self, name: &str) -> Result<Arc<dyn ToolHandler>, CourierError> {
        self.lookup(name).map(|t| Arc::clone(&t.handler))
    }

    /// Declaration and handler together, as needed for dispatch.
    pub fn resolve(&self, name: &str) -> Result<(&ToolDeclaration, &dyn ToolHandler), CourierError> {
        self.lookup(name)
            .map(|t| (&t.declaration, t.handler.as_ref()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.declaration.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&RegisteredTool, CourierError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| CourierError::UnknownTool(name.to_string()))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

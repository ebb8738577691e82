//! Built-in tool set: `get_current_time` and `send_email`.

use std::sync::Arc;

use super::registry::ToolRegistry;
use crate::action::{CurrentTimeAction, EmailAction};
use crate::config::CourierConfig;
use crate::error::CourierError;

impl ToolRegistry {
    /// Registry with the built-in tools, `get_current_time` first.
    pub fn with_builtins(email: EmailAction) -> Result<Self, CourierError> {
        let mut registry = Self::new();
        registry.register(
            CurrentTimeAction::declaration(),
            Arc::new(CurrentTimeAction::new()),
        )?;
        registry.register(EmailAction::declaration(), Arc::new(email))?;
        Ok(registry)
    }

    /// Built-ins wired from configuration (the email endpoint).
    pub fn from_config(config: &CourierConfig) -> Result<Self, CourierError> {
        Self::with_builtins(EmailAction::from_config(config)?)
    }
}

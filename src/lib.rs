//! Courier — tool-call orchestration for chat-completion models.
//!
//! Sends a prompt to a model together with a set of tool declarations,
//! executes the tool calls the model asks for, feeds the results back, and
//! returns the model's final answer.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use courier::prelude::*;
//!
//! # async fn example() -> courier::error::Result<()> {
//! let config = CourierConfig::from_env();
//! let target: ModelTarget = "azure:gpt-4".parse()?;
//! let provider = courier::provider::create_provider(&target, &config)?;
//! let registry = Arc::new(ToolRegistry::from_config(&config)?);
//!
//! let outcome = Orchestrator::new(provider, registry)
//!     .run_conversation("What time is it in Tokyo?")
//!     .await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

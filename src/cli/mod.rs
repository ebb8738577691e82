//! Command-line arguments for the `courier` binary.

use std::path::PathBuf;

use clap::Parser;

/// Prompt used when none is given on the command line.
pub const DEFAULT_PROMPT: &str = "Send an email to Min.Cheng@knightec.se with the subject 'Greetings' and body 'Hello, this is a test email!'";

/// Run one tool-calling exchange against a chat model.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about = "Courier — tool-call orchestration CLI")]
pub struct Cli {
    /// User prompt (positional)
    pub prompt: Option<String>,

    /// Model to use (format: provider:model, e.g., azure:gpt-4 or openai:gpt-4o)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-tool timeout in milliseconds
    #[arg(long)]
    pub tool_timeout_ms: Option<u64>,

    /// Skip the follow-up model call when the first response requested no tools
    #[arg(long)]
    pub return_first_when_no_tools: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_PROMPT)
    }
}

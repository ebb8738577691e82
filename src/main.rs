//! Courier CLI binary entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier::action::ActionInvoker;
use courier::cli::Cli;
use courier::config::CourierConfig;
use courier::models::ModelTarget;
use courier::orchestrator::{ExchangeEvent, ExchangeEventPayload, ExchangeOptions, Orchestrator};
use courier::tools::ToolRegistry;
use courier::types::ModelMessage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    match run(cli).await {
        Ok(answer) => println!("{answer}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = CourierConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model.clone() {
        config.set_model(model);
    }
    if let Some(ms) = cli.tool_timeout_ms {
        config.set_tool_timeout(Duration::from_millis(ms));
    }

    let model = config.model();
    let target: ModelTarget = model.parse().map_err(|_| {
        format!("Invalid model format: '{model}'. Use provider:model (e.g. azure:gpt-4)")
    })?;

    let provider = courier::provider::create_provider(&target, &config)?;
    let registry = Arc::new(ToolRegistry::from_config(&config)?);
    let mut invoker = ActionInvoker::new();
    if let Some(timeout) = config.tool_timeout() {
        invoker = invoker.with_timeout(timeout);
    }

    let orchestrator = Orchestrator::new(provider, registry)
        .with_invoker(invoker)
        .with_options(ExchangeOptions {
            return_first_when_no_tools: cli.return_first_when_no_tools,
        })
        .with_event_sink(Arc::new(first_response_printer()));

    let mut messages = Vec::new();
    if let Some(system) = cli.system.clone() {
        messages.push(ModelMessage::system(system));
    }
    messages.push(ModelMessage::user(cli.prompt()));

    let outcome = orchestrator.run(messages).await?;
    Ok(outcome.text)
}

/// Console trace of the first assistant turn and the function calls it made.
fn first_response_printer() -> impl Fn(ExchangeEvent) + Send + Sync {
    let printed = AtomicBool::new(false);
    move |event: ExchangeEvent| {
        let ExchangeEventPayload::AssistantMessage { message } = &event.payload else {
            return;
        };
        if printed.swap(true, Ordering::SeqCst) {
            return;
        }
        println!("Model's response:");
        println!(
            "{}",
            serde_json::to_string_pretty(message).unwrap_or_else(|_| format!("{message:?}"))
        );
        if message.tool_calls().is_empty() {
            println!("No tool calls were made by the model.");
        }
        for call in message.tool_calls() {
            println!("Function call: {}", call.name);
            println!("Function arguments: {}", call.arguments);
        }
    }
}

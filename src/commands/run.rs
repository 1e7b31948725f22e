//! One-shot completion command

use std::io::Write;

use colored::Colorize;
use futures::StreamExt;

use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_provider, CompletionOptions, Message, Role};
use crate::storage::{CostRecord, CostStore, SessionStore, StoragePaths};

/// Arguments for the `run` command
#[derive(Debug, Default)]
pub struct RunArgs {
    /// Prompt to send
    pub prompt: String,
    /// Model override
    pub model: Option<String>,
    /// Provider override
    pub provider: Option<String>,
    /// Temperature override
    pub temperature: Option<f32>,
    /// Max output tokens override
    pub max_tokens: Option<u32>,
    /// System prompt
    pub system: Option<String>,
    /// Wait for the full response instead of streaming
    pub no_stream: bool,
    /// Session to read context from and append the exchange to
    pub session: Option<String>,
}

/// Runs a one-shot completion, optionally inside a saved session
///
/// With `--session`, the session's system prompt and prior transcript
/// are sent as context, and the new exchange is appended to it. Without
/// streaming, token usage is also recorded to the cost log when
/// tracking is enabled.
pub async fn run(config: &Config, paths: &StoragePaths, args: RunArgs) -> Result<()> {
    let (provider_name, provider_config) = config.get_provider(args.provider.as_deref());
    let provider = create_provider(&provider_name, &provider_config)?;

    let sessions = SessionStore::new(paths.clone());
    let session_meta = match &args.session {
        Some(name) => Some(sessions.meta(name)?),
        None => None,
    };

    let mut messages = Vec::new();
    let system = args
        .system
        .clone()
        .or_else(|| session_meta.as_ref().and_then(|m| m.system.clone()));
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    if let Some(name) = &args.session {
        for entry in sessions.read(name, None)? {
            messages.push(Message {
                role: entry.role,
                content: entry.content,
                name: None,
                metadata: None,
            });
        }
    }
    messages.push(Message::user(&args.prompt));

    let options = CompletionOptions {
        model: args
            .model
            .clone()
            .or_else(|| session_meta.as_ref().and_then(|m| m.model.clone())),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        ..Default::default()
    };

    tracing::info!(
        "Running completion via {} (stream={})",
        provider_name,
        !args.no_stream
    );

    let reply = if args.no_stream {
        let response = provider.complete(&messages, &options).await?;
        println!("{}", response.content);
        println!();
        println!(
            "{}",
            format!(
                "Model: {} | Tokens: {}->{} | Cost: ${:.4} | Latency: {:.0}ms",
                response.model,
                response.input_tokens,
                response.output_tokens,
                response.cost,
                response.latency_ms
            )
            .dimmed()
        );

        if config.costs.track {
            CostStore::new(paths.clone()).record(&CostRecord::from_response(&response))?;
        }
        response.content
    } else {
        let mut stream = provider.stream(&messages, &options).await?;
        let mut collected = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            print!("{}", fragment);
            std::io::stdout().flush()?;
            collected.push_str(&fragment);
        }
        println!();
        collected
    };

    if let Some(name) = &args.session {
        sessions.append(name, Role::User, &args.prompt)?;
        sessions.append(name, Role::Assistant, &reply)?;
    }

    Ok(())
}

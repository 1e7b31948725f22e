//! agentctl - kubectl for AI agents
//!
//! This library provides a unified client layer over multiple AI
//! providers, plus the persistence and orchestration the CLI is built
//! on.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: the Provider trait, the registry, and the Anthropic,
//!   OpenAI, and Ollama adapters with their streaming decoders
//! - `compare`: concurrent multi-model comparison with per-target
//!   failure isolation
//! - `storage`: file-backed sessions and monthly cost buckets, plus the
//!   poll-based log tail
//! - `config`: YAML configuration management
//! - `error`: error types and result alias
//! - `cli` / `commands`: command-line surface and handlers
//!
//! # Example
//!
//! ```no_run
//! use agentctl::config::ProviderConfig;
//! use agentctl::providers::{create_provider, CompletionOptions, Message};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = create_provider("ollama", &ProviderConfig::default())?;
//!     let messages = vec![Message::user("Why is the sky blue?")];
//!     let response = provider
//!         .complete(&messages, &CompletionOptions::default())
//!         .await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use compare::{CompareOutcome, ModelSpec};
pub use config::Config;
pub use error::{AgentctlError, Result};
pub use providers::{CompletionOptions, Message, Provider, Response, Role, TextStream};
pub use storage::StoragePaths;

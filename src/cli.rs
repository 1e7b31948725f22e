//! Command-line interface definition for agentctl
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for one-shot completions, model discovery,
//! sessions, cost tracking, comparisons, and log streaming.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// agentctl - kubectl for AI agents
///
/// Manage, monitor, and debug AI agents across providers from one CLI.
#[derive(Parser, Debug, Clone)]
#[command(name = "agentctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults to config.yaml in the data directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Data directory for sessions, costs, and config
    #[arg(long, env = "AGENTCTL_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for agentctl
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a one-shot completion
    Run {
        /// Prompt to send
        prompt: String,

        /// Model to use (defaults to the provider's default model)
        #[arg(short, long)]
        model: Option<String>,

        /// Provider to use (defaults to the configured default)
        #[arg(short, long)]
        provider: Option<String>,

        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Maximum output tokens
        #[arg(long)]
        max_tokens: Option<u32>,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Wait for the full response instead of streaming
        #[arg(long)]
        no_stream: bool,

        /// Append the exchange to a saved session
        #[arg(long)]
        session: Option<String>,
    },

    /// List available models across configured providers
    Models {
        /// Only query this provider
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Manage conversation sessions
    Session {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// View cost tracking data
    Costs {
        /// Show today's costs only
        #[arg(long)]
        today: bool,

        /// Show costs for a specific month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,

        /// Group by model
        #[arg(long)]
        by_model: bool,
    },

    /// Compare outputs from multiple models
    Compare {
        /// Prompt to send to every target
        prompt: String,

        /// Comma-separated list of provider:model pairs
        #[arg(short, long)]
        models: String,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Stream logs from a session
    Logs {
        /// Session to read
        session_name: String,

        /// Follow logs in real time
        #[arg(short, long)]
        follow: bool,

        /// Number of recent messages to print first
        #[arg(short = 'n', long, default_value_t = 20)]
        last: usize,
    },

    /// Manage provider configurations
    Config {
        /// Config subcommand
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List all saved sessions
    List,

    /// Create a new conversation session
    New {
        /// Session name
        name: String,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Delete a session
    Delete {
        /// Session name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show messages from a session
    Show {
        /// Session name
        name: String,

        /// Show last N messages
        #[arg(short = 'n', long, default_value_t = 10)]
        last: usize,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Configure a provider
    Set {
        /// Provider name
        provider: String,

        /// API key for the provider
        #[arg(long)]
        api_key: Option<String>,

        /// Custom endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Default model for this provider
        #[arg(long)]
        model: Option<String>,
    },

    /// Show current configuration
    Show,

    /// Set the default provider
    Default {
        /// Provider name
        provider: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_defaults_to_streaming() {
        let cli = Cli::parse_from(["agentctl", "run", "Explain TCP"]);
        match cli.command {
            Commands::Run {
                prompt, no_stream, ..
            } => {
                assert_eq!(prompt, "Explain TCP");
                assert!(!no_stream);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "agentctl",
            "run",
            "--provider",
            "ollama",
            "--model",
            "llama3.1:8b",
            "--temperature",
            "0.2",
            "--no-stream",
            "Hello",
        ]);
        match cli.command {
            Commands::Run {
                prompt,
                model,
                provider,
                temperature,
                no_stream,
                ..
            } => {
                assert_eq!(prompt, "Hello");
                assert_eq!(model.as_deref(), Some("llama3.1:8b"));
                assert_eq!(provider.as_deref(), Some("ollama"));
                assert_eq!(temperature, Some(0.2));
                assert!(no_stream);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_compare_requires_models() {
        assert!(Cli::try_parse_from(["agentctl", "compare", "prompt"]).is_err());
        let cli = Cli::parse_from([
            "agentctl",
            "compare",
            "Explain TCP",
            "--models",
            "anthropic:claude-sonnet,openai:gpt-4o",
        ]);
        match cli.command {
            Commands::Compare { models, .. } => {
                assert!(models.contains("openai:gpt-4o"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_logs_defaults() {
        let cli = Cli::parse_from(["agentctl", "logs", "my-agent", "-f"]);
        match cli.command {
            Commands::Logs {
                session_name,
                follow,
                last,
            } => {
                assert_eq!(session_name, "my-agent");
                assert!(follow);
                assert_eq!(last, 20);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_session_new() {
        let cli = Cli::parse_from([
            "agentctl", "session", "new", "demo", "--model", "gpt-4o", "--system", "Be brief",
        ]);
        match cli.command {
            Commands::Session {
                command: SessionCommand::New {
                    name,
                    model,
                    system,
                },
            } => {
                assert_eq!(name, "demo");
                assert_eq!(model.as_deref(), Some("gpt-4o"));
                assert_eq!(system.as_deref(), Some("Be brief"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::parse_from([
            "agentctl", "config", "set", "openai", "--api-key", "sk-test",
        ]);
        match cli.command {
            Commands::Config {
                command: ConfigCommand::Set {
                    provider, api_key, ..
                },
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(api_key.as_deref(), Some("sk-test"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

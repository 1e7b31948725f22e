//! agentctl - kubectl for AI agents
//!
//! Main entry point: parses the CLI, resolves the data root and config,
//! and dispatches to the command handlers.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agentctl::cli::{Cli, Commands, ConfigCommand, SessionCommand};
use agentctl::commands;
use agentctl::commands::run::RunArgs;
use agentctl::config::Config;
use agentctl::storage::StoragePaths;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let paths = StoragePaths::resolve(cli.data_dir.as_deref())?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| paths.config_file());
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Run {
            prompt,
            model,
            provider,
            temperature,
            max_tokens,
            system,
            no_stream,
            session,
        } => {
            commands::run::run(
                &config,
                &paths,
                RunArgs {
                    prompt,
                    model,
                    provider,
                    temperature,
                    max_tokens,
                    system,
                    no_stream,
                    session,
                },
            )
            .await
        }
        Commands::Models { provider } => {
            commands::models::list_models(&config, provider.as_deref()).await
        }
        Commands::Session { command } => match command {
            SessionCommand::List => commands::session::list(&paths),
            SessionCommand::New {
                name,
                model,
                system,
            } => commands::session::new(&paths, &name, model.as_deref(), system.as_deref()),
            SessionCommand::Delete { name, yes } => {
                commands::session::delete(&paths, &name, yes)
            }
            SessionCommand::Show { name, last } => {
                commands::session::show(&paths, &name, last)
            }
        },
        Commands::Costs {
            today,
            month,
            by_model,
        } => commands::costs::show(&config, &paths, today, month.as_deref(), by_model),
        Commands::Compare {
            prompt,
            models,
            system,
        } => {
            commands::compare::run(&config, &paths, &prompt, &models, system.as_deref()).await
        }
        Commands::Logs {
            session_name,
            follow,
            last,
        } => commands::logs::stream(&paths, &session_name, follow, last).await,
        Commands::Config { command } => match command {
            ConfigCommand::Set {
                provider,
                api_key,
                endpoint,
                model,
            } => commands::config_cmd::set(
                &config_path,
                &provider,
                api_key.as_deref(),
                endpoint.as_deref(),
                model.as_deref(),
            ),
            ConfigCommand::Show => commands::config_cmd::show(&config),
            ConfigCommand::Default { provider } => {
                commands::config_cmd::set_default(&config_path, &provider)
            }
        },
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "agentctl=debug" } else { "agentctl=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

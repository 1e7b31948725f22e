//! Model listing command

use prettytable::{row, Table};

use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_provider, provider_names};

/// Lists available models across providers
///
/// With `--provider`, only that provider is queried. Otherwise every
/// configured provider is listed (or every registered provider when the
/// config names none). A provider that fails, such as an unreachable
/// Ollama server, gets an inline error row rather than aborting the
/// whole listing.
pub async fn list_models(config: &Config, provider_filter: Option<&str>) -> Result<()> {
    let providers: Vec<String> = match provider_filter {
        Some(name) => vec![name.to_string()],
        None if config.providers.is_empty() => provider_names(),
        None => {
            let mut names: Vec<String> = config.providers.keys().cloned().collect();
            names.sort();
            names
        }
    };

    let mut table = Table::new();
    table.set_titles(row!["Provider", "Model", "Default"]);

    for name in providers {
        let (_, provider_config) = config.get_provider(Some(&name));
        let listing = match create_provider(&name, &provider_config) {
            Ok(provider) => provider.list_models().await,
            Err(e) => Err(e),
        };

        match listing {
            Ok(models) => {
                for model in models {
                    let is_default = provider_config.default_model.as_deref() == Some(model.as_str());
                    table.add_row(row![name, model, if is_default { "*" } else { "" }]);
                }
            }
            Err(e) => {
                table.add_row(row![name, format!("Error: {}", e), ""]);
            }
        }
    }

    table.printstd();
    Ok(())
}

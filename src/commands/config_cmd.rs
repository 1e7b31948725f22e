//! Configuration management commands

use std::path::Path;

use colored::Colorize;
use prettytable::{row, Table};

use crate::config::Config;
use crate::error::Result;

/// Updates (or creates) a provider's configuration section
pub fn set(
    config_path: &Path,
    provider: &str,
    api_key: Option<&str>,
    endpoint: Option<&str>,
    default_model: Option<&str>,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    let entry = config.providers.entry(provider.to_string()).or_default();

    if let Some(api_key) = api_key {
        entry.api_key = Some(api_key.to_string());
    }
    if let Some(endpoint) = endpoint {
        entry.endpoint = Some(endpoint.to_string());
    }
    if let Some(model) = default_model {
        entry.default_model = Some(model.to_string());
    }

    config.save(config_path)?;
    println!("{} Provider '{}' configured.", "✓".green(), provider);
    Ok(())
}

/// Prints the current configuration, with API keys truncated
pub fn show(config: &Config) -> Result<()> {
    let mut table = Table::new();
    table.set_titles(row!["Provider", "API Key", "Endpoint", "Default Model"]);

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();
    for name in names {
        let p = &config.providers[name];
        let key_display = match &p.api_key {
            Some(key) => key
                .get(..8)
                .map(|prefix| format!("{}...", prefix))
                .unwrap_or_else(|| "***".to_string()),
            None => "-".to_string(),
        };
        table.add_row(row![
            name,
            key_display,
            p.endpoint.as_deref().unwrap_or("default"),
            p.default_model.as_deref().unwrap_or("-")
        ]);
    }
    table.printstd();

    println!("\n{}", "Defaults:".bold());
    println!("  Provider: {}", config.defaults.provider);
    println!("  Temperature: {}", config.defaults.temperature);
    println!("  Max tokens: {}", config.defaults.max_tokens);
    println!(
        "  Cost tracking: {}",
        if config.costs.track { "on" } else { "off" }
    );
    println!(
        "  Alert threshold: ${:.2}/mo",
        config.costs.alert_threshold
    );
    Ok(())
}

/// Sets the default provider
pub fn set_default(config_path: &Path, provider: &str) -> Result<()> {
    let mut config = Config::load(config_path)?;
    config.defaults.provider = provider.to_string();
    config.save(config_path)?;
    println!("{} Default provider set to '{}'.", "✓".green(), provider);
    Ok(())
}

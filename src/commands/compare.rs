//! Multi-model comparison command

use colored::Colorize;
use prettytable::{row, Table};

use crate::compare::{compare, ModelSpec};
use crate::config::Config;
use crate::error::Result;
use crate::providers::Message;
use crate::storage::{CostRecord, CostStore, StoragePaths};

/// Runs the same prompt against several provider:model pairs and
/// renders each outcome plus a summary table
pub async fn run(
    config: &Config,
    paths: &StoragePaths,
    prompt: &str,
    models: &str,
    system: Option<&str>,
) -> Result<()> {
    let specs = ModelSpec::parse_list(models, &config.defaults.provider);
    if specs.is_empty() {
        println!("{}", "No models given.".dimmed());
        return Ok(());
    }

    let mut messages = Vec::new();
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt));

    println!("\n{} {}\n", "Prompt:".bold(), prompt);

    let outcomes = compare(config, &specs, &messages).await;

    let cost_store = CostStore::new(paths.clone());
    let mut summary = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(response) => {
                println!("{}", format!("=== {} ===", outcome.spec.label()).cyan().bold());
                println!("{}", response.content);
                println!(
                    "{}",
                    format!(
                        "{}->{} tokens | ${:.4} | {:.0}ms",
                        response.input_tokens,
                        response.output_tokens,
                        response.cost,
                        response.latency_ms
                    )
                    .dimmed()
                );
                println!();

                if config.costs.track {
                    cost_store.record(&CostRecord::from_response(response))?;
                }
                summary.push((outcome.spec.label(), response));
            }
            Err(e) => {
                println!(
                    "{}",
                    format!("Error with {}: {}", outcome.spec.label(), e).red()
                );
                println!();
            }
        }
    }

    if summary.len() > 1 {
        let mut table = Table::new();
        table.set_titles(row!["Model", "Output Tokens", "Cost", "Latency"]);
        for (label, response) in summary {
            table.add_row(row![
                label,
                response.output_tokens,
                format!("${:.4}", response.cost),
                format!("{:.0}ms", response.latency_ms)
            ]);
        }
        table.printstd();
    }
    Ok(())
}

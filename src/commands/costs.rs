//! Cost reporting command

use colored::Colorize;
use prettytable::{row, Table};

use crate::config::Config;
use crate::error::Result;
use crate::storage::{costs::by_model, CostStore, StoragePaths};

/// Shows recorded costs for a period
///
/// Defaults to the current month; `--today` narrows to today and
/// `--month` selects another bucket. The monthly total turns red when
/// it crosses the configured alert threshold.
pub fn show(
    config: &Config,
    paths: &StoragePaths,
    today: bool,
    month: Option<&str>,
    group_by_model: bool,
) -> Result<()> {
    let store = CostStore::new(paths.clone());
    let period = if today {
        crate::storage::current_day()
    } else {
        month
            .map(str::to_string)
            .unwrap_or_else(crate::storage::current_month)
    };

    let records = if today {
        store.load_today()?
    } else {
        store.load(month)?
    };

    if records.is_empty() {
        println!("{}", "No cost data found for this period.".dimmed());
        return Ok(());
    }

    let total_cost: f64 = records.iter().map(|r| r.cost).sum();
    let total_display = if total_cost > config.costs.alert_threshold {
        format!("${:.4}", total_cost).red().bold().to_string()
    } else {
        format!("${:.4}", total_cost).green().to_string()
    };

    if group_by_model {
        let stats = by_model(&records);
        let mut table = Table::new();
        table.set_titles(row!["Model", "Calls", "Tokens (in/out)", "Cost"]);
        for (model, s) in &stats {
            table.add_row(row![
                model,
                s.calls,
                format!("{} / {}", s.input_tokens, s.output_tokens),
                format!("${:.4}", s.cost)
            ]);
        }
        table.add_row(row!["Total", records.len(), "", total_display]);
        table.printstd();
    } else {
        let total_input: u64 = records.iter().map(|r| r.input_tokens).sum();
        let total_output: u64 = records.iter().map(|r| r.output_tokens).sum();

        println!("{} {}", "Period:".bold(), period);
        println!("{} {}", "Total calls:".bold(), records.len());
        println!(
            "{} {} in / {} out",
            "Total tokens:".bold(),
            total_input,
            total_output
        );
        println!("{} {}", "Total cost:".bold(), total_display);
    }
    Ok(())
}

//! Session management commands

use std::io::Write;

use colored::Colorize;
use prettytable::{row, Table};

use crate::commands::print_message;
use crate::error::Result;
use crate::storage::{SessionStore, StoragePaths};

/// Lists all saved sessions
pub fn list(paths: &StoragePaths) -> Result<()> {
    let store = SessionStore::new(paths.clone());
    let sessions = store.list()?;

    if sessions.is_empty() {
        println!(
            "{}",
            "No sessions found. Start one with: agentctl session new <name>".dimmed()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_titles(row!["Name", "Model", "Messages", "Created", "Last Active"]);
    for (meta, count) in sessions {
        table.add_row(row![
            meta.name,
            meta.model.as_deref().unwrap_or("-"),
            count,
            meta.created,
            meta.last_active
        ]);
    }
    table.printstd();
    Ok(())
}

/// Creates a new session
pub fn new(
    paths: &StoragePaths,
    name: &str,
    model: Option<&str>,
    system: Option<&str>,
) -> Result<()> {
    let store = SessionStore::new(paths.clone());
    let meta = store.create(name, model, system)?;

    println!("{} Session '{}' created.", "✓".green(), meta.name);
    if let Some(model) = meta.model {
        println!("  Model: {}", model);
    }
    Ok(())
}

/// Deletes a session, prompting for confirmation unless `--yes`
pub fn delete(paths: &StoragePaths, name: &str, yes: bool) -> Result<()> {
    let store = SessionStore::new(paths.clone());

    if !yes {
        print!("Delete session '{}'? [y/N] ", name);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.delete(name)?;
    println!("{} Session '{}' deleted.", "✓".green(), name);
    Ok(())
}

/// Shows the last messages of a session
pub fn show(paths: &StoragePaths, name: &str, last: usize) -> Result<()> {
    let store = SessionStore::new(paths.clone());
    let messages = store.read(name, Some(last))?;

    if messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return Ok(());
    }
    for message in &messages {
        print_message(message);
    }
    Ok(())
}

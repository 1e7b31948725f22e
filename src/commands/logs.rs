//! Session log streaming command

use std::time::Duration;

use colored::Colorize;

use crate::commands::print_message;
use crate::error::Result;
use crate::storage::{SessionStore, StoragePaths};

/// Poll interval for follow mode
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Prints the last messages of a session, then optionally follows new
/// appends until interrupted
pub async fn stream(
    paths: &StoragePaths,
    session_name: &str,
    follow: bool,
    last: usize,
) -> Result<()> {
    let store = SessionStore::new(paths.clone());

    for message in store.read(session_name, Some(last))? {
        print_message(&message);
    }

    if !follow {
        return Ok(());
    }

    println!("\n{}\n", "Following... (Ctrl+C to stop)".dimmed());
    let mut tail = store.tail(session_name)?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "Stopped following.".dimmed());
                return Ok(());
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                for message in tail.poll_new()? {
                    print_message(&message);
                }
            }
        }
    }
}

//! Command handlers for the CLI
//!
//! One module per subcommand. Handlers are thin: they resolve
//! configuration and storage paths, call into the library, and render
//! the result for the terminal.

pub mod compare;
pub mod config_cmd;
pub mod costs;
pub mod logs;
pub mod models;
pub mod run;
pub mod session;

use colored::Colorize;

use crate::providers::Role;
use crate::storage::SessionMessage;

/// Prints one transcript message with a role-colored prefix
pub(crate) fn print_message(message: &SessionMessage) {
    let role = match message.role {
        Role::User => "user".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
        Role::System => "system".yellow().bold(),
    };
    println!(
        "{} {}: {}",
        message.timestamp.dimmed(),
        role,
        message.content
    );
}

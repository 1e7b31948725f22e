//! Error types for agentctl
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for agentctl operations
///
/// This enum encompasses all possible failures during provider calls,
/// configuration loading, and log-store access. Provider failures are
/// split by cause so callers can distinguish a bad credential from a
/// network problem or a malformed provider response.
#[derive(Error, Debug)]
pub enum AgentctlError {
    /// Requested provider name is not registered
    #[error("Unknown provider '{name}'. Available: {}", available_list(.available))]
    UnknownProvider {
        /// The name that failed to resolve
        name: String,
        /// Names currently present in the registry
        available: Vec<String>,
    },

    /// Credential rejected by the provider (401/403)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network or HTTP-level failure (connect, timeout, non-auth error status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider response did not match the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Referenced session or log file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn available_list(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

/// Result type alias for agentctl operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

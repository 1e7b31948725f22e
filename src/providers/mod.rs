//! AI provider abstraction for agentctl
//!
//! This module defines the Provider trait, the common message and
//! response types, the streaming decoders, and the registry that maps
//! provider names to constructors. The registry is populated exactly
//! once at first use; there is no runtime registration.

pub mod anthropic;
pub mod base;
pub mod ollama;
pub mod openai;
pub mod streaming;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use reqwest::StatusCode;

pub use anthropic::AnthropicProvider;
pub use base::{
    split_system, CompletionOptions, Message, Provider, Response, Role, TextStream,
};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{AgentctlError, Result};

/// Constructor signature stored in the registry
pub type ProviderFactory = fn(&ProviderConfig) -> Result<Box<dyn Provider>>;

/// Static price table rows: (model substring, input, output) per 1M tokens
///
/// Matching is by substring containment, first row wins, so row order is
/// part of the table's meaning.
pub type PriceTable = &'static [(&'static str, f64, f64)];

fn registry() -> &'static BTreeMap<&'static str, ProviderFactory> {
    static REGISTRY: OnceLock<BTreeMap<&'static str, ProviderFactory>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        BTreeMap::from([
            ("anthropic", AnthropicProvider::factory as ProviderFactory),
            ("ollama", OllamaProvider::factory as ProviderFactory),
            ("openai", OpenAiProvider::factory as ProviderFactory),
        ])
    })
}

/// Lists every registered provider name, sorted
///
/// # Examples
///
/// ```
/// let names = agentctl::providers::provider_names();
/// assert_eq!(names, vec!["anthropic", "ollama", "openai"]);
/// ```
pub fn provider_names() -> Vec<String> {
    registry().keys().map(|name| name.to_string()).collect()
}

/// Instantiates a provider by registry name
///
/// # Errors
///
/// Returns `UnknownProvider` (listing the registered names) when `name`
/// is not in the registry, or the factory's own error when construction
/// fails.
///
/// # Examples
///
/// ```
/// use agentctl::config::ProviderConfig;
/// use agentctl::providers::create_provider;
///
/// let provider = create_provider("ollama", &ProviderConfig::default()).unwrap();
/// assert_eq!(provider.name(), "ollama");
/// ```
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match registry().get(name) {
        Some(factory) => factory(config),
        None => Err(AgentctlError::UnknownProvider {
            name: name.to_string(),
            available: provider_names(),
        }
        .into()),
    }
}

/// Estimates the cost of a call in USD from a static price table
///
/// Returns 0.0 when no row matches; hosted callers treat that as
/// "unknown", the local-inference adapter as genuinely free.
pub(crate) fn estimate_cost(
    model: &str,
    pricing: PriceTable,
    input_tokens: u64,
    output_tokens: u64,
) -> f64 {
    for (key, input_price, output_price) in pricing {
        if model.contains(key) {
            return (input_tokens as f64 * input_price + output_tokens as f64 * output_price)
                / 1_000_000.0;
        }
    }
    0.0
}

/// Maps a non-success HTTP status to the right error variant
///
/// 401 and 403 become `Auth`; every other error status becomes
/// `Transport` with the status and body included.
pub(crate) async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} returned {}: {}", provider, status, body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(AgentctlError::Auth(format!("{} rejected the credential ({}): {}", provider, status, body)).into())
    } else {
        Err(AgentctlError::Transport(format!("{} returned {}: {}", provider, status, body)).into())
    }
}

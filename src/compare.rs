//! Multi-model comparison
//!
//! Fans the same conversation out to several provider/model pairs
//! concurrently and collects one outcome per pair, in input order. A
//! failing pair never aborts the batch; its error is captured alongside
//! the successes.

use futures::future::join_all;

use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_provider, CompletionOptions, Message, Response};

/// One provider/model pair targeted by a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Registry name of the provider
    pub provider: String,
    /// Model identifier passed to the provider
    pub model: String,
}

impl ModelSpec {
    /// Parses a single `provider:model` spec
    ///
    /// A spec without a colon is a bare model name served by the
    /// default provider. Only the first colon splits, so Ollama tags
    /// like `ollama:llama3.1:8b` keep their suffix.
    pub fn parse(spec: &str, default_provider: &str) -> Self {
        match spec.split_once(':') {
            Some((provider, model)) => Self {
                provider: provider.to_string(),
                model: model.to_string(),
            },
            None => Self {
                provider: default_provider.to_string(),
                model: spec.to_string(),
            },
        }
    }

    /// Parses a comma-separated list of specs, preserving order
    ///
    /// # Examples
    ///
    /// ```
    /// use agentctl::compare::ModelSpec;
    ///
    /// let specs = ModelSpec::parse_list("anthropic:claude-sonnet, gpt-4o", "openai");
    /// assert_eq!(specs.len(), 2);
    /// assert_eq!(specs[1].provider, "openai");
    /// assert_eq!(specs[1].model, "gpt-4o");
    /// ```
    pub fn parse_list(specs: &str, default_provider: &str) -> Vec<Self> {
        specs
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self::parse(s, default_provider))
            .collect()
    }

    /// Display label, `provider:model`
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

/// Result of one comparison target
pub struct CompareOutcome {
    /// The pair this outcome belongs to
    pub spec: ModelSpec,
    /// The response, or the isolated failure for this pair
    pub result: Result<Response>,
}

/// Runs the same conversation against every target concurrently
///
/// Outcomes come back in the order the specs were given, regardless of
/// completion order. An unknown provider name, a failed construction,
/// or a failed call all surface as that pair's error only.
pub async fn compare(
    config: &Config,
    specs: &[ModelSpec],
    messages: &[Message],
) -> Vec<CompareOutcome> {
    let calls = specs.iter().map(|spec| async move {
        let result = run_one(config, spec, messages).await;
        if let Err(e) = &result {
            tracing::warn!("Comparison target {} failed: {}", spec.label(), e);
        }
        CompareOutcome {
            spec: spec.clone(),
            result,
        }
    });
    join_all(calls).await
}

async fn run_one(config: &Config, spec: &ModelSpec, messages: &[Message]) -> Result<Response> {
    let (_, provider_config) = config.get_provider(Some(&spec.provider));
    let provider = create_provider(&spec.provider, &provider_config)?;
    let options = CompletionOptions {
        model: Some(spec.model.clone()),
        ..Default::default()
    };
    provider.complete(messages, &options).await
}

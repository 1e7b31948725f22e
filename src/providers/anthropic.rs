//! Anthropic provider implementation for agentctl
//!
//! This module implements the Provider trait for the Anthropic Messages
//! API. The system prompt travels in a dedicated top-level field, never
//! in the turn array, and streaming responses arrive as SSE events.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{AgentctlError, Result};
use crate::providers::base::{
    split_system, CompletionOptions, Message, Provider, Response, TextStream,
};
use crate::providers::streaming::{decode_anthropic_line, decode_stream};
use crate::providers::{error_for_status, estimate_cost, PriceTable};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

/// Pricing per 1M tokens (as of Feb 2026); first substring match wins
const PRICING: PriceTable = &[
    ("claude-sonnet", 3.0, 15.0),
    ("claude-haiku", 0.25, 1.25),
    ("claude-opus", 15.0, 75.0),
];

/// Anthropic Messages API provider
///
/// Talks to the hosted Anthropic API (or an endpoint override for
/// tests). Construction never touches the network; a missing API key is
/// reported as an `Auth` error when a completion is attempted, so
/// offline operations like the static model catalogue keep working.
pub struct AnthropicProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    default_model: String,
}

/// Request body for POST /v1/messages
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: String,
    content: &'a str,
}

/// Response body from POST /v1/messages
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from its config section
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error if HTTP client initialization fails.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("agentctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AgentctlError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        let endpoint = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string();
        let default_model = config
            .default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        tracing::debug!("Initialized Anthropic provider: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            default_model,
        })
    }

    /// Registry factory
    pub(crate) fn factory(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
        Ok(Box::new(Self::new(config)?))
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AgentctlError::Auth("no API key configured for anthropic".to_string()).into()
        })
    }

    fn build_request<'a>(
        &'a self,
        options: &'a CompletionOptions,
        system: &'a Option<String>,
        turns: &'a [&'a Message],
        stream: bool,
    ) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: options.model_or(&self.default_model),
            max_tokens: options.max_tokens_or_default(),
            temperature: options.temperature_or_default(),
            messages: turns
                .iter()
                .map(|m| WireMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            system: system.as_deref(),
            stream,
        }
    }

    async fn post_messages(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let (system, turns) = split_system(messages);
        let request = self.build_request(options, &system, &turns, stream);

        tracing::debug!(
            "Anthropic request: model={}, {} turns, stream={}",
            request.model,
            request.messages.len(),
            stream
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentctlError::Transport(format!("Anthropic request failed: {}", e)))?;

        error_for_status("anthropic", response).await
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Response> {
        let model = options.model_or(&self.default_model).to_string();
        let start = Instant::now();
        let response = self.post_messages(messages, options, false).await?;
        let body: AnthropicResponse = response.json().await.map_err(|e| {
            AgentctlError::Protocol(format!("Failed to parse Anthropic response: {}", e))
        })?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let content = body
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| {
                AgentctlError::Protocol("Anthropic response has no content blocks".to_string())
            })?;

        tracing::debug!(
            "Anthropic response: {} input tokens, {} output tokens, {:.0}ms",
            body.usage.input_tokens,
            body.usage.output_tokens,
            latency_ms
        );

        Ok(Response {
            content,
            model: model.clone(),
            provider: "anthropic".to_string(),
            input_tokens: body.usage.input_tokens,
            output_tokens: body.usage.output_tokens,
            cost: estimate_cost(
                &model,
                PRICING,
                body.usage.input_tokens,
                body.usage.output_tokens,
            ),
            latency_ms,
            metadata: Default::default(),
        })
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<TextStream> {
        let response = self.post_messages(messages, options, true).await?;
        Ok(decode_stream(response.bytes_stream(), decode_anthropic_line))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec![
            "claude-sonnet-4-20250514".to_string(),
            "claude-haiku-3-5-20241022".to_string(),
            "claude-opus-4-20250514".to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_key() -> AnthropicProvider {
        AnthropicProvider::new(&ProviderConfig {
            api_key: Some("sk-ant-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new(&ProviderConfig::default());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let provider = AnthropicProvider::new(&ProviderConfig {
            endpoint: Some("http://localhost:9999/".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(provider.endpoint, "http://localhost:9999");
    }

    #[test]
    fn test_missing_api_key_is_auth_error() {
        let provider = AnthropicProvider::new(&ProviderConfig::default()).unwrap();
        let err = provider.api_key().unwrap_err();
        assert!(err.to_string().starts_with("Authentication error"));
    }

    #[test]
    fn test_request_lifts_system_out_of_turns() {
        let provider = provider_with_key();
        let messages = vec![Message::system("Be brief"), Message::user("Hi")];
        let options = CompletionOptions::default();
        let (system, turns) = split_system(&messages);
        let request = provider.build_request(&options, &system, &turns, false);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "Be brief");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        // Non-streaming requests omit the stream flag entirely
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_request_defaults() {
        let provider = provider_with_key();
        let messages = vec![Message::user("Hi")];
        let options = CompletionOptions::default();
        let (system, turns) = split_system(&messages);
        let request = provider.build_request(&options, &system, &turns, true);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["stream"], true);
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_pricing_sonnet() {
        let cost = estimate_cost("claude-sonnet-4-20250514", PRICING, 1_000_000, 1_000_000);
        assert!((cost - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_pricing_unknown_model_is_free() {
        assert_eq!(estimate_cost("claude-next", PRICING, 1000, 1000), 0.0);
    }

    #[tokio::test]
    async fn test_list_models_is_static() {
        let provider = AnthropicProvider::new(&ProviderConfig::default()).unwrap();
        let models = provider.list_models().await.unwrap();
        assert_eq!(models.len(), 3);
        assert_eq!(models[0], "claude-sonnet-4-20250514");
    }
}

//! OpenAI provider implementation for agentctl
//!
//! This module implements the Provider trait for the OpenAI chat
//! completions API. Like the Anthropic adapter, the system prompt is
//! sent as a dedicated top-level field rather than as a turn, and
//! streaming responses arrive as SSE chunks terminated by `[DONE]`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{AgentctlError, Result};
use crate::providers::base::{
    split_system, CompletionOptions, Message, Provider, Response, TextStream,
};
use crate::providers::streaming::{decode_openai_line, decode_stream};
use crate::providers::{error_for_status, estimate_cost, PriceTable};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Pricing per 1M tokens (as of Feb 2026); first substring match wins
const PRICING: PriceTable = &[
    ("gpt-4o", 2.50, 10.0),
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4-turbo", 10.0, 30.0),
    ("o1", 15.0, 60.0),
];

/// OpenAI chat completions provider
///
/// Talks to the hosted OpenAI API (or an endpoint override for tests).
/// Construction never touches the network; a missing API key surfaces
/// as an `Auth` error when a completion is attempted.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    default_model: String,
}

/// Request body for POST /v1/chat/completions
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
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

/// Response body from POST /v1/chat/completions
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAiProvider {
    /// Creates a new OpenAI provider from its config section
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

        tracing::debug!("Initialized OpenAI provider: endpoint={}", endpoint);

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
            AgentctlError::Auth("no API key configured for openai".to_string()).into()
        })
    }

    fn build_request<'a>(
        &'a self,
        options: &'a CompletionOptions,
        system: &'a Option<String>,
        turns: &'a [&'a Message],
        stream: bool,
    ) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: options.model_or(&self.default_model),
            messages: turns
                .iter()
                .map(|m| WireMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens_or_default(),
            temperature: options.temperature_or_default(),
            system: system.as_deref(),
            stream,
        }
    }

    async fn post_chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let (system, turns) = split_system(messages);
        let request = self.build_request(options, &system, &turns, stream);

        tracing::debug!(
            "OpenAI request: model={}, {} turns, stream={}",
            request.model,
            request.messages.len(),
            stream
        );

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentctlError::Transport(format!("OpenAI request failed: {}", e)))?;

        error_for_status("openai", response).await
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Response> {
        let model = options.model_or(&self.default_model).to_string();
        let start = Instant::now();
        let response = self.post_chat(messages, options, false).await?;
        let body: OpenAiResponse = response.json().await.map_err(|e| {
            AgentctlError::Protocol(format!("Failed to parse OpenAI response: {}", e))
        })?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AgentctlError::Protocol("OpenAI response has no choices".to_string())
            })?;

        tracing::debug!(
            "OpenAI response: {} prompt tokens, {} completion tokens, {:.0}ms",
            body.usage.prompt_tokens,
            body.usage.completion_tokens,
            latency_ms
        );

        Ok(Response {
            content,
            model: model.clone(),
            provider: "openai".to_string(),
            input_tokens: body.usage.prompt_tokens,
            output_tokens: body.usage.completion_tokens,
            cost: estimate_cost(
                &model,
                PRICING,
                body.usage.prompt_tokens,
                body.usage.completion_tokens,
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
        let response = self.post_chat(messages, options, true).await?;
        Ok(decode_stream(response.bytes_stream(), decode_openai_line))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4-turbo".to_string(),
            "o1".to_string(),
            "o1-mini".to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_key() -> OpenAiProvider {
        OpenAiProvider::new(&ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new(&ProviderConfig::default());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_missing_api_key_is_auth_error() {
        let provider = OpenAiProvider::new(&ProviderConfig::default()).unwrap();
        let err = provider.api_key().unwrap_err();
        assert!(err.to_string().starts_with("Authentication error"));
    }

    #[test]
    fn test_request_lifts_system_out_of_turns() {
        let provider = provider_with_key();
        let messages = vec![
            Message::system("Answer in French"),
            Message::user("Hello"),
            Message::assistant("Bonjour"),
        ];
        let options = CompletionOptions::default();
        let (system, turns) = split_system(&messages);
        let request = provider.build_request(&options, &system, &turns, false);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "Answer in French");
        let wire = json["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 2);
        assert!(wire.iter().all(|m| m["role"] != "system"));
    }

    #[test]
    fn test_request_defaults() {
        let provider = provider_with_key();
        let messages = vec![Message::user("Hello")];
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
    fn test_pricing_gpt_4o() {
        let cost = estimate_cost("gpt-4o", PRICING, 1_000_000, 1_000_000);
        assert!((cost - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_pricing_order_preserved() {
        // gpt-4o-mini contains gpt-4o, and the gpt-4o row comes first
        let cost = estimate_cost("gpt-4o-mini", PRICING, 1_000_000, 1_000_000);
        assert!((cost - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_pricing_o1() {
        let cost = estimate_cost("o1-mini", PRICING, 1_000_000, 1_000_000);
        assert!((cost - 75.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_list_models_is_static() {
        let provider = OpenAiProvider::new(&ProviderConfig::default()).unwrap();
        let models = provider.list_models().await.unwrap();
        assert_eq!(models.len(), 5);
        assert!(models.contains(&"gpt-4o-mini".to_string()));
    }
}

//! Ollama provider implementation for agentctl
//!
//! This module implements the Provider trait for a local (or remote)
//! Ollama server. Streaming responses arrive as newline-delimited JSON
//! records, and the model catalogue is queried live from /api/tags.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{AgentctlError, Result};
use crate::providers::base::{CompletionOptions, Message, Provider, Response, TextStream};
use crate::providers::streaming::{decode_ollama_line, decode_stream};
use crate::providers::error_for_status;

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Ollama local-inference provider
///
/// Connects to an Ollama server to generate completions. Local models
/// carry no metered cost, so `cost` is always exactly 0.0 and means
/// "free" here rather than "unknown". The generous timeout accounts for
/// cold model loads.
pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    default_model: String,
}

/// Request body for POST /api/chat
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationOptions {
    temperature: f32,
}

/// Response body from POST /api/chat (non-streaming)
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Response body from GET /api/tags
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    /// Creates a new Ollama provider from its config section
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error if HTTP client initialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use agentctl::config::ProviderConfig;
    /// use agentctl::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(&ProviderConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
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

        tracing::debug!("Initialized Ollama provider: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint,
            default_model,
        })
    }

    /// Registry factory
    pub(crate) fn factory(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
        Ok(Box::new(Self::new(config)?))
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a CompletionOptions,
        stream: bool,
    ) -> OllamaRequest<'a> {
        OllamaRequest {
            model: options.model_or(&self.default_model),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            stream,
            options: GenerationOptions {
                temperature: options.temperature_or_default(),
            },
        }
    }

    async fn post_chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = self.build_request(messages, options, stream);

        tracing::debug!(
            "Ollama request: model={}, {} messages, stream={}",
            request.model,
            request.messages.len(),
            stream
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AgentctlError::Transport(format!("Failed to connect to Ollama server: {}", e))
            })?;

        error_for_status("ollama", response).await
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Response> {
        let model = options.model_or(&self.default_model).to_string();
        let start = Instant::now();
        let response = self.post_chat(messages, options, false).await?;
        let body: OllamaResponse = response.json().await.map_err(|e| {
            AgentctlError::Protocol(format!("Failed to parse Ollama response: {}", e))
        })?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            "Ollama response: {} prompt tokens, {} eval tokens, {:.0}ms",
            body.prompt_eval_count,
            body.eval_count,
            latency_ms
        );

        Ok(Response {
            content: body.message.content,
            model,
            provider: "ollama".to_string(),
            input_tokens: body.prompt_eval_count,
            output_tokens: body.eval_count,
            // Local inference is free, not "cost unknown"
            cost: 0.0,
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
        Ok(decode_stream(response.bytes_stream(), decode_ollama_line))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.endpoint);
        tracing::debug!("Fetching Ollama model list from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AgentctlError::Transport(format!("Failed to connect to Ollama server: {}", e))
        })?;
        let response = error_for_status("ollama", response).await?;

        let tags: TagsResponse = response.json().await.map_err(|e| {
            AgentctlError::Protocol(format!("Failed to parse Ollama tags response: {}", e))
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

//! Base provider trait and common types for agentctl
//!
//! This module defines the Provider trait that all AI providers must
//! implement, along with the canonical message and response structures
//! shared by every adapter.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model, lifted into a dedicated field by
    /// providers that do not accept it inline
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::AgentctlError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(crate::error::AgentctlError::Config(format!(
                "invalid role '{}' (expected system, user, or assistant)",
                other
            ))),
        }
    }
}

/// A single message in a conversation
///
/// Messages are immutable once constructed; a conversation is an ordered
/// sequence of them. A leading system message is special-cased by the
/// hosted adapters (see [`split_system`]).
///
/// # Examples
///
/// ```
/// use agentctl::providers::Message;
///
/// let msg = Message::user("Hello, assistant!");
/// assert_eq!(msg.role.to_string(), "user");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Optional participant name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form metadata carried through to persisted logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use agentctl::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
            metadata: None,
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            name: None,
            metadata: None,
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use agentctl::providers::{Message, Role};
    ///
    /// let msg = Message::system("You are a helpful assistant");
    /// assert_eq!(msg.role, Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            name: None,
            metadata: None,
        }
    }
}

/// Splits system messages out of a conversation
///
/// Returns the content of the last system message (if any) and the
/// remaining turns in order. Hosted providers send the system prompt as a
/// dedicated top-level field, so it must never appear in their native turn
/// array, and its content must never be dropped.
pub fn split_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let mut system = None;
    let mut turns = Vec::with_capacity(messages.len());
    for message in messages {
        if message.role == Role::System {
            system = Some(message.content.clone());
        } else {
            turns.push(message);
        }
    }
    (system, turns)
}

/// Options for a completion call
///
/// Unset fields fall back to the documented defaults. Unrecognized
/// provider-specific settings travel in `extra` and are ignored by
/// adapters that do not understand them (forward compatibility).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Model identifier override
    pub model: Option<String>,
    /// Sampling temperature in `[0, 2]`, default 0.7
    pub temperature: Option<f32>,
    /// Maximum output tokens, default 4096
    pub max_tokens: Option<u32>,
    /// Provider-specific extras, ignored by convention
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

impl CompletionOptions {
    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    /// Default output token cap
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    /// Effective temperature, applying the default when unset
    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(Self::DEFAULT_TEMPERATURE)
    }

    /// Effective max-token cap, applying the default when unset
    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS)
    }

    /// Effective model, falling back to the adapter's default model
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

/// A response from an AI provider
///
/// Produced once per completion call and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Final generated text
    pub content: String,
    /// Model that produced the response
    pub model: String,
    /// Provider name
    pub provider: String,
    /// Provider-reported input token count (0 if unavailable)
    #[serde(default)]
    pub input_tokens: u64,
    /// Provider-reported output token count (0 if unavailable)
    #[serde(default)]
    pub output_tokens: u64,
    /// Estimated cost in USD (0.0 means unknown for hosted providers)
    #[serde(default)]
    pub cost: f64,
    /// Wall-clock duration of the network exchange in milliseconds
    #[serde(default)]
    pub latency_ms: f64,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

/// Lazy, finite, non-restartable sequence of streamed text fragments
///
/// Concatenating every fragment in order reproduces the content that
/// `complete` would have returned for an equivalent call. The stream
/// fails mid-sequence with the same error kinds as `complete`; the
/// consumer then holds a partial, non-recoverable prefix.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Provider trait for AI providers
///
/// All providers (Anthropic, OpenAI, Ollama, etc.) implement this trait.
/// It provides a common interface for blocking completions, incremental
/// streaming, and model discovery.
///
/// # Examples
///
/// ```no_run
/// use agentctl::providers::{CompletionOptions, Message, Provider, Response, TextStream};
/// use agentctl::error::Result;
/// use async_trait::async_trait;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl Provider for MyProvider {
///     fn name(&self) -> &'static str {
///         "my-provider"
///     }
///
///     async fn complete(
///         &self,
///         _messages: &[Message],
///         _options: &CompletionOptions,
///     ) -> Result<Response> {
///         unimplemented!()
///     }
///
///     async fn stream(
///         &self,
///         _messages: &[Message],
///         _options: &CompletionOptions,
///     ) -> Result<TextStream> {
///         unimplemented!()
///     }
///
///     async fn list_models(&self) -> Result<Vec<String>> {
///         Ok(vec!["my-model".to_string()])
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name as it appears in the registry
    fn name(&self) -> &'static str;

    /// Sends messages and blocks until the full response is available
    ///
    /// # Errors
    ///
    /// Returns `Transport` on network/HTTP failure, `Auth` when the
    /// credential is rejected, and `Protocol` when the response shape is
    /// unexpected.
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Response>;

    /// Streams the response as incremental text fragments
    ///
    /// Fails with the same error kinds as [`Provider::complete`], either
    /// up front or mid-stream. Dropping the stream releases the
    /// underlying connection.
    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<TextStream>;

    /// Lists available model identifiers, in provider-defined order
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the catalogue requires a network call and
    /// the provider is unreachable.
    async fn list_models(&self) -> Result<Vec<String>>;
}

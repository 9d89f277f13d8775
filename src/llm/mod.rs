//! Completion client abstraction.
//!
//! The store never calls a model. A [`CompletionProvider`] turns a chat
//! transcript into the assistant's next reply, and
//! [`ChatSession`](crate::services::ChatSession) records both turns through
//! the store's append operation.

mod openai;

pub use openai::OpenAiClient;

use crate::Result;
use crate::models::{BaseMessage, Message};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for chat completion providers.
pub trait CompletionProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Returns the assistant reply to `messages`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no reply.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

impl<C: CompletionProvider + ?Sized> CompletionProvider for &C {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages)
    }
}

impl<C: CompletionProvider + ?Sized> CompletionProvider for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages)
    }
}

/// A message in the wire shape completion APIs expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a chat message.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(&message.role, &message.content)
    }
}

impl From<ChatMessage> for BaseMessage {
    fn from(message: ChatMessage) -> Self {
        Self::new(message.role, message.content)
    }
}

/// HTTP client configuration for completion providers.
#[derive(Debug, Clone, Copy)]
pub struct CompletionHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for CompletionHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl CompletionHttpConfig {
    /// Applies `PARLEY_COMPLETION_TIMEOUT_MS` and
    /// `PARLEY_COMPLETION_CONNECT_TIMEOUT_MS`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(timeout_ms) = env_millis("PARLEY_COMPLETION_TIMEOUT_MS") {
            self.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = env_millis("PARLEY_COMPLETION_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = connect_timeout_ms;
        }
        self
    }
}

fn env_millis(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builds a blocking HTTP client with the configured timeouts.
#[must_use]
pub fn build_http_client(config: CompletionHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build completion HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

//! Chat completion backends.

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use serde::Serialize;

use crate::error::CompletionError;
use crate::session::Role;

/// One message sent to a completion model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// Speaker.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Builds a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request envelope shared by the various providers.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    /// Ordered conversation, system prompt first.
    pub messages: &'a [ChatMessage],
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
}

/// Trait implemented by concrete LLM providers.
pub trait LlmProvider {
    /// Generates a reply and returns its text verbatim.
    fn answer(&self, request: &ProviderRequest<'_>) -> Result<String, CompletionError>;
}

impl<P: LlmProvider + ?Sized> LlmProvider for Box<P> {
    fn answer(&self, request: &ProviderRequest<'_>) -> Result<String, CompletionError> {
        (**self).answer(request)
    }
}

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{LlmProvider, ProviderRequest};
use crate::error::CompletionError;
use crate::session::Role;

/// Anthropic Messages API client.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl AnthropicProvider {
    /// Builds a client posting to `{base_url}/v1/messages`.
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::Config("missing Anthropic API key".into()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            client,
        })
    }
}

impl LlmProvider for AnthropicProvider {
    fn answer(&self, request: &ProviderRequest<'_>) -> Result<String, CompletionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.trim())
                .map_err(|_| CompletionError::Config("invalid Anthropic API key".into()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // System prompts travel in a top-level field, not as a message.
        let system = request
            .messages
            .iter()
            .filter(|message| message.role == Role::System)
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        // The conversation must open with a user turn.
        let messages = request
            .messages
            .iter()
            .filter(|message| message.role != Role::System)
            .skip_while(|message| message.role == Role::Assistant)
            .map(|message| AnthropicMessage {
                role: message.role.as_str(),
                content: vec![AnthropicContentBlock {
                    kind: "text",
                    text: &message.content,
                }],
            })
            .collect();
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: (!system.is_empty()).then_some(system.as_str()),
            messages,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(CompletionError::Status { status, body });
        }
        let parsed: AnthropicResponse = resp
            .json()
            .map_err(|err| CompletionError::Decode(err.to_string()))?;
        let answer = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if answer.is_empty() {
            return Err(CompletionError::Decode(
                "Anthropic response missing text content".into(),
            ));
        }
        Ok(answer)
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<AnthropicContentBlock<'a>>,
}

#[derive(Serialize)]
struct AnthropicContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

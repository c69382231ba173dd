use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmProvider, ProviderRequest};
use crate::error::CompletionError;

/// OpenAI Chat Completions client.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl OpenAiProvider {
    /// Builds a client posting to `{base_url}/chat/completions`.
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::Config("missing OpenAI API key".into()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn answer(&self, request: &ProviderRequest<'_>) -> Result<String, CompletionError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| CompletionError::Config("invalid OpenAI API key".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: request.messages,
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
        let parsed: ChatResponse = resp
            .json()
            .map_err(|err| CompletionError::Decode(err.to_string()))?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Decode("response carried no message content".into()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn provider(server: &Server) -> OpenAiProvider {
        OpenAiProvider::new(
            "sk-test".into(),
            "gpt-3.5-turbo".into(),
            &server.url(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn sends_messages_and_returns_content_verbatim() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.5,
                "max_tokens": 500,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "how do I authenticate?"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [{"message": {"role": "assistant", "content": "  Use a token.\n"}}]})
                    .to_string(),
            )
            .create();

        let messages = vec![
            ChatMessage::new(Role::System, "be brief"),
            ChatMessage::new(Role::User, "how do I authenticate?"),
        ];
        let answer = provider(&server)
            .answer(&ProviderRequest {
                messages: &messages,
                temperature: 0.5,
                max_tokens: 500,
            })
            .unwrap();

        mock.assert();
        assert_eq!(answer, "  Use a token.\n");
    }

    #[test]
    fn server_error_is_typed() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create();

        let err = provider(&server)
            .answer(&ProviderRequest {
                messages: &[ChatMessage::new(Role::User, "hi")],
                temperature: 0.7,
                max_tokens: 10,
            })
            .unwrap_err();

        assert!(matches!(err, CompletionError::Status { status, .. } if status.as_u16() == 503));
    }

    #[test]
    fn empty_choices_is_a_decode_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(json!({"choices": []}).to_string())
            .create();

        let err = provider(&server)
            .answer(&ProviderRequest {
                messages: &[ChatMessage::new(Role::User, "hi")],
                temperature: 0.7,
                max_tokens: 10,
            })
            .unwrap_err();

        assert!(matches!(err, CompletionError::Decode(_)));
    }
}

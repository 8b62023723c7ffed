//! OpenAI-compatible chat completions adapter.
//!
//! Flat message list, temperature always sent, Bearer auth. Works with any
//! server exposing `/chat/completions` in the OpenAI shape.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::http;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, ChatOptions, ProviderSettings};
use crate::domain::ports::AiProvider;

const NAME: &str = "openai";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiProvider {
    settings: ProviderSettings,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings, timeout_secs: u64) -> DomainResult<Self> {
        Ok(Self {
            settings,
            client: http::build_client(NAME, timeout_secs)?,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        http::resolve_api_key(&self.settings, API_KEY_ENV).is_some()
    }

    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> DomainResult<String> {
        let api_key = http::resolve_api_key(&self.settings, API_KEY_ENV)
            .ok_or_else(|| DomainError::ProviderNotConfigured(NAME.to_string()))?;

        let request = ChatCompletionRequest {
            model: options.model.clone().unwrap_or_else(|| self.settings.model.clone()),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature.unwrap_or(self.settings.temperature),
            max_tokens: options.max_tokens.or(Some(self.settings.max_tokens)),
        };

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| http::send_error(NAME, e))?;

        let response = http::ensure_success(NAME, response).await?;
        let body: ChatCompletionResponse = http::parse_json(NAME, response).await?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(DomainError::provider(NAME, "empty completion", false));
        }
        Ok(text)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: String,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn provider(base_url: String) -> OpenAiProvider {
        let settings = ProviderSettings {
            api_key: Some("sk-test".to_string()),
            base_url,
            model: "gpt-test".to_string(),
            temperature: 0.7,
            max_tokens: 512,
        };
        OpenAiProvider::new(settings, 5).unwrap()
    }

    #[tokio::test]
    async fn test_chat_sends_flat_messages_with_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-test",
                "temperature": 0.2,
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "be terse"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"ok\":true}"}}]}"#)
            .create_async()
            .await;

        let text = provider(server.url())
            .chat(
                &[ChatMessage::system("be terse"), ChatMessage::user("hello")],
                &ChatOptions::new().with_temperature(0.2),
            )
            .await
            .unwrap();

        assert_eq!(text, r#"{"ok":true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let err = provider(server.url())
            .chat(&[ChatMessage::user("hi")], &ChatOptions::new())
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(err.to_string().contains("openai"));
    }

    #[tokio::test]
    async fn test_empty_content_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":""}}]}"#)
            .create_async()
            .await;

        let err = provider(server.url())
            .chat(&[ChatMessage::user("hi")], &ChatOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProviderFailed { transient: false, .. }));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let settings = ProviderSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ProviderSettings::openai()
        };
        let provider = OpenAiProvider::new(settings, 1).unwrap();
        let result = temp_env::async_with_vars([(API_KEY_ENV, None::<&str>)], async {
            provider.chat(&[ChatMessage::user("hi")], &ChatOptions::new()).await
        })
        .await;
        assert!(matches!(result, Err(DomainError::ProviderNotConfigured(name)) if name == "openai"));
    }
}

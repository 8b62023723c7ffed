//! Google Gemini `generateContent` adapter.
//!
//! System messages go to `systemInstruction`; the assistant role is sent as
//! `model`. Temperature is only included when it differs from the neutral 1.0.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::http;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, ChatOptions, ChatRole, ProviderSettings};
use crate::domain::ports::AiProvider;

const NAME: &str = "gemini";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const NEUTRAL_TEMPERATURE: f32 = 1.0;

pub struct GeminiProvider {
    settings: ProviderSettings,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: ProviderSettings, timeout_secs: u64) -> DomainResult<Self> {
        Ok(Self {
            settings,
            client: http::build_client(NAME, timeout_secs)?,
        })
    }

    fn build_request(&self, messages: &[ChatMessage], options: &ChatOptions) -> GenerateRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let contents = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| Content {
                role: Some(match m.role {
                    ChatRole::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![Part { text: Some(m.content.clone()) }],
            })
            .collect();

        let temperature = options.temperature.unwrap_or(self.settings.temperature);

        GenerateRequest {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: Some(system.join("\n\n")) }],
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: ((temperature - NEUTRAL_TEMPERATURE).abs() > f32::EPSILON)
                    .then_some(temperature),
                max_output_tokens: options.max_tokens.unwrap_or(self.settings.max_tokens),
            },
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        http::resolve_api_key(&self.settings, API_KEY_ENV).is_some()
    }

    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> DomainResult<String> {
        let api_key = http::resolve_api_key(&self.settings, API_KEY_ENV)
            .ok_or_else(|| DomainError::ProviderNotConfigured(NAME.to_string()))?;

        let model = options.model.as_deref().unwrap_or(&self.settings.model);
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .json(&self.build_request(messages, options))
            .send()
            .await
            .map_err(|e| http::send_error(NAME, e))?;

        let response = http::ensure_success(NAME, response).await?;
        let body: GenerateResponse = http::parse_json(NAME, response).await?;

        if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(DomainError::provider(NAME, format!("prompt blocked: {}", reason), false));
        }

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(NAME, "response has no candidates", false))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(DomainError::provider(
                NAME,
                format!("empty content (finish reason: {})", reason),
                false,
            ));
        }
        Ok(text)
    }
}

// -- Gemini API request/response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn provider(base_url: String) -> GeminiProvider {
        let settings = ProviderSettings {
            api_key: Some("g-test".to_string()),
            base_url,
            model: "gemini-test".to_string(),
            temperature: 1.0,
            max_tokens: 256,
        };
        GeminiProvider::new(settings, 5).unwrap()
    }

    #[test]
    fn test_request_maps_roles_and_omits_neutral_temperature() {
        let provider = provider("http://unused".to_string());
        let request = provider.build_request(
            &[
                ChatMessage::system("rules"),
                ChatMessage::user("q"),
                ChatMessage::assistant("a"),
            ],
            &ChatOptions::new(),
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "rules");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert!(value["generationConfig"].get("temperature").is_none());
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_request_includes_non_neutral_temperature() {
        let provider = provider("http://unused".to_string());
        let request =
            provider.build_request(&[ChatMessage::user("q")], &ChatOptions::new().with_temperature(0.3));
        let value = serde_json::to_value(&request).unwrap();
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_chat_concatenates_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "g-test".into()))
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"a\":"},{"text":"1}"}]},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        let text = provider(server.url())
            .chat(&[ChatMessage::user("hello")], &ChatOptions::new())
            .await
            .unwrap();

        assert_eq!(text, r#"{"a":1}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let err = provider(server.url())
            .chat(&[ChatMessage::user("hello")], &ChatOptions::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let result = provider(server.url())
            .chat(&[ChatMessage::user("hello")], &ChatOptions::new())
            .await;
        assert!(matches!(result, Err(DomainError::ProviderFailed { .. })));
    }
}

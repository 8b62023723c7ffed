//! Anthropic Messages API adapter.
//!
//! `max_tokens` is mandatory on this API and the response content is an
//! array of typed blocks; only `text` blocks contribute to the result.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::http;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, ChatOptions, ChatRole, ProviderSettings};
use crate::domain::ports::AiProvider;

const NAME: &str = "anthropic";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    settings: ProviderSettings,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings, timeout_secs: u64) -> DomainResult<Self> {
        Ok(Self {
            settings,
            client: http::build_client(NAME, timeout_secs)?,
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        http::resolve_api_key(&self.settings, API_KEY_ENV).is_some()
    }

    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> DomainResult<String> {
        let api_key = http::resolve_api_key(&self.settings, API_KEY_ENV)
            .ok_or_else(|| DomainError::ProviderNotConfigured(NAME.to_string()))?;

        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let request = MessagesRequest {
            model: options.model.clone().unwrap_or_else(|| self.settings.model.clone()),
            max_tokens: options.max_tokens.unwrap_or(self.settings.max_tokens),
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: Some(options.temperature.unwrap_or(self.settings.temperature)),
        };

        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::send_error(NAME, e))?;

        let response = http::ensure_success(NAME, response).await?;
        let body: MessagesResponse = http::parse_json(NAME, response).await?;

        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        if text.trim().is_empty() {
            return Err(DomainError::provider(
                NAME,
                format!(
                    "empty content (stop reason: {})",
                    body.stop_reason.as_deref().unwrap_or("unknown")
                ),
                false,
            ));
        }
        Ok(text)
    }
}

// -- Anthropic API request/response types --

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

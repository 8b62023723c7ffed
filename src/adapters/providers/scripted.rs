//! Deterministic provider for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, ChatOptions};
use crate::domain::ports::AiProvider;

/// What a scripted call returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedResponse {
    Text(String),
    Failure { message: String, transient: bool },
}

impl ScriptedResponse {
    pub fn text(output: impl Into<String>) -> Self {
        ScriptedResponse::Text(output.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        ScriptedResponse::Text(value.to_string())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ScriptedResponse::Failure {
            message: message.into(),
            transient: false,
        }
    }

    pub fn transient_failure(message: impl Into<String>) -> Self {
        ScriptedResponse::Failure {
            message: message.into(),
            transient: true,
        }
    }
}

/// A recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

impl RecordedCall {
    /// All message contents joined, as matched by rules.
    pub fn prompt(&self) -> String {
        prompt_text(&self.messages)
    }
}

fn prompt_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Provider answering from rules, a queue, or a default.
///
/// Resolution order per call: the first rule whose pattern occurs in the
/// prompt, then the next queued response, then the default.
pub struct ScriptedProvider {
    rules: Vec<(String, ScriptedResponse)>,
    queue: Mutex<VecDeque<ScriptedResponse>>,
    default_response: ScriptedResponse,
    configured: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default_response: ScriptedResponse::failure("no scripted response"),
            configured: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every prompt containing `pattern` with `response`.
    pub fn with_rule(mut self, pattern: impl Into<String>, response: ScriptedResponse) -> Self {
        self.rules.push((pattern.into(), response));
        self
    }

    /// Queue a one-shot response.
    pub fn then(mut self, response: ScriptedResponse) -> Self {
        self.queue.get_mut().push_back(response);
        self
    }

    pub fn with_default(mut self, response: ScriptedResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Report missing credentials.
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn resolve(&self, prompt: &str) -> ScriptedResponse {
        if let Some((_, response)) = self.rules.iter().find(|(pattern, _)| prompt.contains(pattern.as_str())) {
            return response.clone();
        }
        if let Some(response) = self.queue.lock().await.pop_front() {
            return response;
        }
        self.default_response.clone()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> DomainResult<String> {
        if !self.configured {
            return Err(DomainError::ProviderNotConfigured(self.name().to_string()));
        }

        self.calls.lock().await.push(RecordedCall {
            messages: messages.to_vec(),
            options: options.clone(),
        });

        match self.resolve(&prompt_text(messages)).await {
            ScriptedResponse::Text(text) => Ok(text),
            ScriptedResponse::Failure { message, transient } => {
                Err(DomainError::provider(self.name(), message, transient))
            }
        }
    }
}

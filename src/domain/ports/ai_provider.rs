//! AI provider port - uniform chat completion over interchangeable backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ChatMessage, ChatOptions};

/// A chat-completion backend.
///
/// Implementations translate the message list into their own wire shape and
/// return the raw response text. Structured-data extraction is the caller's
/// concern. Upstream failures, empty or blocked content and missing
/// credentials surface as `DomainError::ProviderFailed` or
/// `DomainError::ProviderNotConfigured` carrying the provider name.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name (e.g., "openai", "gemini", "anthropic").
    fn name(&self) -> &'static str;

    /// Whether credentials are present. Checked before any network call.
    fn is_configured(&self) -> bool;

    /// Run one chat completion.
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> DomainResult<String>;
}

//! Provider selection by configured name.

use std::sync::Arc;

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AiConfig, ProviderSettings};
use crate::domain::ports::AiProvider;

/// The closed set of chat-completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::OpenAi, ProviderKind::Gemini, ProviderKind::Anthropic];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    fn settings<'a>(&self, config: &'a AiConfig) -> &'a ProviderSettings {
        match self {
            ProviderKind::OpenAi => &config.openai,
            ProviderKind::Gemini => &config.gemini,
            ProviderKind::Anthropic => &config.anthropic,
        }
    }

    fn build(&self, config: &AiConfig) -> DomainResult<Arc<dyn AiProvider>> {
        let settings = self.settings(config).clone();
        let timeout = config.request_timeout_secs;
        Ok(match self {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(settings, timeout)?),
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(settings, timeout)?),
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(settings, timeout)?),
        })
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the configured provider and validates it before use.
pub struct ProviderRouter {
    config: AiConfig,
    active: ProviderKind,
}

impl ProviderRouter {
    /// Fails with `UnknownProvider` when `ai.provider` names no known backend.
    pub fn from_config(config: &AiConfig) -> DomainResult<Self> {
        let active = ProviderKind::from_str(&config.provider)
            .ok_or_else(|| DomainError::UnknownProvider(config.provider.clone()))?;
        Ok(Self {
            config: config.clone(),
            active,
        })
    }

    pub fn active_kind(&self) -> ProviderKind {
        self.active
    }

    /// The active provider, or `ProviderNotConfigured` when it lacks
    /// credentials. No network I/O happens here.
    pub fn active(&self) -> DomainResult<Arc<dyn AiProvider>> {
        self.provider(self.active)
    }

    pub fn provider(&self, kind: ProviderKind) -> DomainResult<Arc<dyn AiProvider>> {
        let provider = kind.build(&self.config)?;
        if !provider.is_configured() {
            return Err(DomainError::ProviderNotConfigured(kind.as_str().to_string()));
        }
        Ok(provider)
    }

    /// Providers that currently have credentials.
    pub fn configured_kinds(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.provider(*kind).is_ok())
            .collect()
    }
}

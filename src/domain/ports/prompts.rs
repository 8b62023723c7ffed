//! Prompt producer port. Prompt wording is opaque to the pipeline.

use serde::Serialize;

/// Which agent a prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Collector,
    ProfileSynthesizer,
    Analyst,
    Strategist,
    Critic,
    LiteAnalyst,
    LiteStrategist,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Collector => "collector",
            PromptKind::ProfileSynthesizer => "profile_synthesizer",
            PromptKind::Analyst => "analyst",
            PromptKind::Strategist => "strategist",
            PromptKind::Critic => "critic",
            PromptKind::LiteAnalyst => "lite_analyst",
            PromptKind::LiteStrategist => "lite_strategist",
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Renders the prompt for one agent call from its typed context, serialized
/// to JSON.
pub trait PromptTemplates: Send + Sync {
    fn render(&self, kind: PromptKind, context: &serde_json::Value) -> RenderedPrompt;
}

//! Pipeline agents.
//!
//! Every agent is one prompt, one provider call and one extraction,
//! followed by normalization into a fully populated output. Extraction
//! failures degrade to documented defaults; only provider and configuration
//! errors propagate.

pub mod analyst;
pub mod collector;
pub mod critic;
pub mod lite;
pub mod profile;
pub mod strategist;

pub use analyst::{AnalystAgent, AnalystInput, BenchmarkPosition};
pub use collector::{CollectorAgent, CollectorInput};
pub use critic::{CriticAgent, CriticInput};
pub use lite::{LiteAnalystAgent, LiteStrategistAgent};
pub use profile::{ProfileInput, ProfileSynthesizerAgent};
pub use strategist::{StrategistAgent, StrategistInput};

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ChatMessage, ChatOptions};
use crate::domain::ports::{AiProvider, PromptKind, PromptTemplates};
use crate::services::json_extractor::JsonExtractor;

/// Sampling parameters for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentTuning {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AgentTuning {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }

    pub fn with_temperature(self, temperature: Option<f32>) -> Self {
        Self {
            temperature: temperature.unwrap_or(self.temperature),
            ..self
        }
    }
}

/// Provider and prompt producer shared by all agents of a run.
#[derive(Clone)]
pub struct AgentRuntime {
    provider: Arc<dyn AiProvider>,
    prompts: Arc<dyn PromptTemplates>,
}

impl AgentRuntime {
    pub fn new(provider: Arc<dyn AiProvider>, prompts: Arc<dyn PromptTemplates>) -> Self {
        Self { provider, prompts }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Render, call and extract. `Ok(None)` means the response held no JSON.
    pub async fn call<C>(&self, kind: PromptKind, context: &C, tuning: AgentTuning) -> DomainResult<Option<Value>>
    where
        C: Serialize + Sync,
    {
        let context = serde_json::to_value(context)?;
        let prompt = self.prompts.render(kind, &context);
        let messages = [ChatMessage::system(prompt.system), ChatMessage::user(prompt.user)];
        let options = ChatOptions::new()
            .with_temperature(tuning.temperature)
            .with_max_tokens(tuning.max_tokens);

        let started = Instant::now();
        let text = self.provider.chat(&messages, &options).await?;
        tracing::debug!(
            agent = kind.as_str(),
            provider = self.provider.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_chars = text.chars().count(),
            "Agent call returned"
        );

        let extracted = JsonExtractor::extract(&text, kind.as_str());
        if extracted.is_none() {
            tracing::warn!(agent = kind.as_str(), "Agent output unparseable, using defaults");
        }
        Ok(extracted)
    }
}

/// Trimmed string at `key`; numbers and booleans are stringified.
pub(crate) fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

/// Strings at `key`. A lone string becomes a one-element list, non-string
/// elements are stringified, blanks are dropped.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Merge `overlay` into `base`.
///
/// Objects merge key by key. Elsewhere the overlay wins, except that a null
/// or a value of a different JSON kind never replaces an object or array.
pub(crate) fn deep_merge(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Null => {}
        Value::Object(overlay_map) => match base {
            Value::Object(base_map) => {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => deep_merge(existing, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
            Value::Array(_) => {}
            _ => *base = Value::Object(overlay_map),
        },
        Value::Array(items) => {
            if !base.is_object() {
                *base = Value::Array(items);
            }
        }
        scalar => {
            if !base.is_object() && !base.is_array() {
                *base = scalar;
            }
        }
    }
}

/// Lenient number: JSON numbers or numeric strings.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_keeps_skeleton_shape() {
        let mut base = json!({"a": {"x": 0, "y": 0}, "list": [], "n": 1});
        deep_merge(
            &mut base,
            json!({"a": {"x": 5, "z": 2}, "list": "oops", "n": null, "extra": true}),
        );
        assert_eq!(base, json!({"a": {"x": 5, "y": 0, "z": 2}, "list": [], "n": 1, "extra": true}));
    }

    #[test]
    fn test_deep_merge_object_not_replaced_by_scalar() {
        let mut base = json!({"financial": {"revenue": 0}});
        deep_merge(&mut base, json!({"financial": "good"}));
        assert_eq!(base, json!({"financial": {"revenue": 0}}));
    }

    #[test]
    fn test_string_helpers() {
        let v = json!({"s": "  hi ", "n": 3, "list": ["a", " ", 2], "one": "solo"});
        assert_eq!(string_field(&v, "s"), "hi");
        assert_eq!(string_field(&v, "n"), "3");
        assert_eq!(string_field(&v, "missing"), "");
        assert_eq!(string_list(&v, "list"), vec!["a", "2"]);
        assert_eq!(string_list(&v, "one"), vec!["solo"]);
    }

    #[test]
    fn test_as_f64_lenient() {
        assert_eq!(as_f64(&json!(72)), Some(72.0));
        assert_eq!(as_f64(&json!(" 64.5 ")), Some(64.5));
        assert_eq!(as_f64(&json!("12%")), Some(12.0));
        assert_eq!(as_f64(&json!("high")), None);
    }
}

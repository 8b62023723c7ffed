//! Strategist agent: turns the analysis into ranked suggestions.

use serde::Serialize;
use serde_json::Value;

use super::{as_f64, string_field, string_list, AgentRuntime, AgentTuning};
use crate::domain::errors::DomainResult;
use crate::domain::models::suggestion::{truncate_chars, MAX_TITLE_CHARS};
use crate::domain::models::{
    Alert, ExpectedImpact, HealthSummary, KnowledgeHit, NicheMatch, Opportunity, PreviousSuggestion,
    StoreProfile, StrategistOutput, SuggestionCategory, SuggestionDraft,
};
use crate::domain::ports::PromptKind;

pub(crate) const TUNING: AgentTuning = AgentTuning::new(0.7, 4096);

#[derive(Debug, Clone, Serialize)]
pub struct StrategistInput<'a> {
    pub store_name: &'a str,
    pub niche: &'a NicheMatch,
    pub health: &'a HealthSummary,
    pub alerts: &'a [Alert],
    pub opportunities: &'a [Opportunity],
    pub analysis: &'a Value,
    pub collector_summary: Option<&'a str>,
    pub profile: Option<&'a StoreProfile>,
    pub strategies: &'a [KnowledgeHit],
    /// Earlier suggestions the strategist must not repeat.
    pub previous_suggestions: &'a [PreviousSuggestion],
    pub exemplars: &'a [String],
    pub max_suggestions: usize,
}

pub struct StrategistAgent {
    runtime: AgentRuntime,
}

impl StrategistAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    /// `temperature_override` comes from the analysis module.
    pub async fn run(
        &self,
        input: &StrategistInput<'_>,
        temperature_override: Option<f32>,
    ) -> DomainResult<StrategistOutput> {
        let tuning = TUNING.with_temperature(temperature_override);
        let extracted = self.runtime.call(PromptKind::Strategist, input, tuning).await?;
        Ok(normalize(extracted, input.max_suggestions))
    }
}

/// Candidate list from a `{"suggestions": [...]}` object or a bare array.
pub(crate) fn candidates(extracted: &Value) -> Option<&Vec<Value>> {
    match extracted {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("suggestions").and_then(Value::as_array),
        _ => None,
    }
}

/// Keep valid candidates, rank them by priority and cap the count.
pub fn normalize(extracted: Option<Value>, max_suggestions: usize) -> StrategistOutput {
    let Some(items) = extracted.as_ref().and_then(candidates) else {
        return StrategistOutput {
            suggestions: Vec::new(),
            discarded: 0,
            degraded: true,
        };
    };

    let mut suggestions = Vec::with_capacity(items.len());
    let mut discarded = 0;
    for (index, item) in items.iter().enumerate() {
        match normalize_draft(item, index) {
            Some(draft) => suggestions.push(draft),
            None => discarded += 1,
        }
    }
    if discarded > 0 {
        tracing::debug!(discarded, "Dropped suggestions missing required fields");
    }

    rank(&mut suggestions);
    suggestions.truncate(max_suggestions);

    StrategistOutput {
        suggestions,
        discarded,
        degraded: false,
    }
}

/// Validate one candidate.
///
/// Requires non-empty category, title, description, recommended action and
/// expected impact. Titles are cut to [`MAX_TITLE_CHARS`]. Missing priority
/// falls back to list position.
pub(crate) fn normalize_draft(item: &Value, index: usize) -> Option<SuggestionDraft> {
    if !item.is_object() {
        return None;
    }

    let category = SuggestionCategory::parse(&string_field(item, "category"))?;
    let title = string_field(item, "title");
    let description = string_field(item, "description");
    let mut recommended_action = string_field(item, "recommended_action");
    if recommended_action.is_empty() {
        recommended_action = string_field(item, "action");
    }
    let impact = string_field(item, "expected_impact");

    if title.is_empty() || description.is_empty() || recommended_action.is_empty() || impact.is_empty() {
        return None;
    }

    let priority = item
        .get("priority")
        .and_then(as_f64)
        .filter(|p| p.is_finite() && *p >= 1.0)
        .map(|p| p.round() as u32)
        .unwrap_or(index as u32 + 1);

    let quality_score = item
        .get("quality_score")
        .and_then(as_f64)
        .filter(|q| q.is_finite());

    Some(SuggestionDraft {
        category,
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        description,
        recommended_action,
        expected_impact: ExpectedImpact::parse(&impact),
        target_metrics: string_list(item, "target_metrics"),
        supporting_data: item
            .get("supporting_data")
            .or_else(|| item.get("specific_data"))
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
        justification: string_field(item, "justification"),
        priority,
        quality_score,
    })
}

/// Stable sort by (priority, impact desc), then renumber from 1.
pub(crate) fn rank(suggestions: &mut [SuggestionDraft]) {
    suggestions.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.expected_impact.weight().cmp(&a.expected_impact.weight()))
    });
    for (i, s) in suggestions.iter_mut().enumerate() {
        s.priority = i as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(title: &str, impact: &str, priority: u32) -> Value {
        json!({
            "category": "estoque",
            "title": title,
            "description": "Repor itens esgotados",
            "recommended_action": "Comprar lote",
            "expected_impact": impact,
            "priority": priority,
        })
    }

    #[test]
    fn test_drops_candidates_missing_required_fields() {
        let out = normalize(
            Some(json!({"suggestions": [
                candidate("Repor estoque", "alto", 2),
                {"category": "pricing", "title": "Sem descrição", "recommended_action": "x", "expected_impact": "low"},
                {"category": "", "title": "Sem categoria", "description": "d", "recommended_action": "x", "expected_impact": "low"},
                {"category": "pricing", "title": "Sem impacto", "description": "d", "recommended_action": "x"},
                "not an object",
            ]})),
            9,
        );
        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.discarded, 4);
        assert_eq!(out.suggestions[0].expected_impact, ExpectedImpact::High);
        assert_eq!(out.suggestions[0].category, SuggestionCategory::Inventory);
    }

    #[test]
    fn test_accepts_top_level_array_and_ranks() {
        let out = normalize(
            Some(json!([
                candidate("B", "baixo", 2),
                candidate("A", "médio", 1),
                candidate("C", "high", 2),
            ])),
            2,
        );
        let titles: Vec<&str> = out.suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(out.suggestions[1].priority, 2);
    }

    #[test]
    fn test_title_truncated_and_defaults_filled() {
        let long = "x".repeat(400);
        let out = normalize(Some(json!({"suggestions": [candidate(&long, "whatever", 1)]})), 9);
        let draft = &out.suggestions[0];
        assert_eq!(draft.title.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(draft.expected_impact, ExpectedImpact::Medium);
        assert!(draft.target_metrics.is_empty());
        assert_eq!(draft.supporting_data, json!({}));
    }

    #[test]
    fn test_unparseable_output_is_empty_and_degraded() {
        let out = normalize(None, 9);
        assert!(out.degraded);
        assert!(out.suggestions.is_empty());
        assert!(normalize(Some(json!({"other": 1})), 9).degraded);
    }
}

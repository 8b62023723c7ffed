//! Critic agent: approves, rewrites or removes strategist suggestions.

use serde::Serialize;
use serde_json::Value;

use super::strategist::{normalize_draft, rank};
use super::{as_f64, string_field, AgentRuntime, AgentTuning};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CriticObservations, CriticOutput, HealthSummary, NicheMatch, PreviousSuggestion, RemovedSuggestion,
    SuggestionDraft,
};
use crate::domain::ports::PromptKind;

const TUNING: AgentTuning = AgentTuning::new(0.2, 4096);

const NOT_APPROVED_REASON: &str = "not approved by critic";
const UNMATCHED_REASON: &str = "unmatched critic entry";

#[derive(Debug, Clone, Serialize)]
pub struct CriticInput<'a> {
    pub store_name: &'a str,
    pub niche: &'a NicheMatch,
    pub health: &'a HealthSummary,
    pub suggestions: &'a [SuggestionDraft],
    pub previous_suggestions: &'a [PreviousSuggestion],
    /// Extra validation rules from the analysis module.
    pub rules: &'a [String],
}

pub struct CriticAgent {
    runtime: AgentRuntime,
}

impl CriticAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub async fn run(&self, input: &CriticInput<'_>) -> DomainResult<CriticOutput> {
        if input.suggestions.is_empty() {
            return Ok(review(None, input.suggestions));
        }
        let extracted = self.runtime.call(PromptKind::Critic, input, TUNING).await?;
        Ok(review(extracted, input.suggestions))
    }
}

/// Apply a critic response to the strategist's suggestions.
///
/// Each approved entry is matched to its original by title or index, and its
/// `final_version` is merged over the original. Originals the critic neither
/// approved nor removed are recorded as removed. When the response has no
/// `approved_suggestions` list, every suggestion passes through unreviewed.
pub fn review(extracted: Option<Value>, originals: &[SuggestionDraft]) -> CriticOutput {
    let response = extracted.filter(|v| v.get("approved_suggestions").is_some_and(Value::is_array));

    let Some(response) = response else {
        if !originals.is_empty() {
            tracing::warn!(count = originals.len(), "Critic unavailable, passing suggestions through");
        }
        return CriticOutput {
            approved: originals.to_vec(),
            removed: Vec::new(),
            observations: CriticObservations {
                total_received: originals.len(),
                total_approved: originals.len(),
                total_removed: 0,
                average_quality: 0.0,
                critic_available: originals.is_empty(),
                notes: if originals.is_empty() {
                    Vec::new()
                } else {
                    vec!["critic output unavailable; suggestions passed through unreviewed".to_string()]
                },
            },
        };
    };

    let mut used = vec![false; originals.len()];
    let mut approved = Vec::new();
    let mut unmatched = Vec::new();
    let mut unmatched_count = 0;
    let empty = Vec::new();
    let entries = response["approved_suggestions"].as_array().unwrap_or(&empty);

    for (position, entry) in entries.iter().enumerate() {
        let original = match_original(entry, originals, &used);
        match original {
            Some(i) => used[i] = true,
            None => unmatched_count += 1,
        }
        match merge_entry(entry, original.map(|i| &originals[i]), position) {
            Some(draft) => approved.push(draft),
            None => unmatched.push(RemovedSuggestion {
                title: entry_title(entry).unwrap_or_else(|| format!("entry {}", position + 1)),
                reason: UNMATCHED_REASON.to_string(),
            }),
        }
    }

    let mut removed: Vec<RemovedSuggestion> = response
        .get("removed_suggestions")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(removed_entry).collect())
        .unwrap_or_default();
    removed.extend(unmatched);

    for (i, original) in originals.iter().enumerate() {
        if used[i] {
            continue;
        }
        let already_listed = removed
            .iter()
            .any(|r| r.title.trim().eq_ignore_ascii_case(original.title.trim()));
        if !already_listed {
            removed.push(RemovedSuggestion {
                title: original.title.clone(),
                reason: NOT_APPROVED_REASON.to_string(),
            });
        }
    }

    rank(&mut approved);

    let scores: Vec<f64> = approved.iter().filter_map(|d| d.quality_score).collect();
    let average_quality = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    CriticOutput {
        observations: CriticObservations {
            total_received: originals.len() + unmatched_count,
            total_approved: approved.len(),
            total_removed: removed.len(),
            average_quality,
            critic_available: true,
            notes: observation_notes(response.get("observations")),
        },
        approved,
        removed,
    }
}

fn entry_title(entry: &Value) -> Option<String> {
    ["original_title", "title"]
        .iter()
        .map(|key| string_field(entry, key))
        .find(|t| !t.is_empty())
}

fn match_original(entry: &Value, originals: &[SuggestionDraft], used: &[bool]) -> Option<usize> {
    if let Some(title) = entry_title(entry) {
        if let Some(i) = originals
            .iter()
            .enumerate()
            .position(|(i, o)| !used[i] && o.title.trim().eq_ignore_ascii_case(&title))
        {
            return Some(i);
        }
    }

    entry
        .get("original_index")
        .or_else(|| entry.get("index"))
        .and_then(as_f64)
        .filter(|i| *i >= 0.0)
        .map(|i| i as usize)
        .filter(|i| *i < originals.len() && !used[*i])
}

/// `final_version` merged over the original; falls back to the original when
/// the merged result is invalid.
fn merge_entry(entry: &Value, original: Option<&SuggestionDraft>, position: usize) -> Option<SuggestionDraft> {
    let mut merged = original
        .and_then(|o| serde_json::to_value(o).ok())
        .unwrap_or_else(|| Value::Object(Default::default()));

    let final_version = entry
        .get("final_version")
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| {
            // Some responses inline the suggestion fields on the entry itself.
            let mut inline = entry.clone();
            if let Value::Object(map) = &mut inline {
                map.remove("original_title");
                map.remove("original_index");
                map.remove("quality_score");
            }
            inline
        });

    if let (Value::Object(base), Value::Object(overlay)) = (&mut merged, final_version) {
        for (key, value) in overlay {
            if !value.is_null() {
                base.insert(key, value);
            }
        }
    }

    let mut draft = normalize_draft(&merged, position).or_else(|| original.cloned())?;
    if let Some(original) = original {
        if entry.get("final_version").and_then(|v| v.get("priority")).is_none() {
            draft.priority = original.priority;
        }
    }
    draft.quality_score = entry
        .get("quality_score")
        .and_then(as_f64)
        .filter(|q| q.is_finite())
        .or(draft.quality_score);
    Some(draft)
}

fn removed_entry(item: &Value) -> Option<RemovedSuggestion> {
    match item {
        Value::String(title) if !title.trim().is_empty() => Some(RemovedSuggestion {
            title: title.trim().to_string(),
            reason: String::new(),
        }),
        Value::Object(_) => {
            let mut title = string_field(item, "title");
            if title.is_empty() {
                title = string_field(item, "original_title");
            }
            let reason = string_field(item, "reason");
            (!title.is_empty()).then_some(RemovedSuggestion { title, reason })
        }
        _ => None,
    }
}

fn observation_notes(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| match i {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}: {}", k, s),
                other => format!("{}: {}", k, other),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExpectedImpact, SuggestionCategory};
    use serde_json::json;

    fn draft(title: &str, priority: u32) -> SuggestionDraft {
        SuggestionDraft {
            category: SuggestionCategory::Marketing,
            title: title.to_string(),
            description: format!("{} description", title),
            recommended_action: "do it".to_string(),
            expected_impact: ExpectedImpact::Medium,
            target_metrics: vec!["revenue".to_string()],
            supporting_data: json!({}),
            justification: String::new(),
            priority,
            quality_score: None,
        }
    }

    #[test]
    fn test_final_version_merged_and_quality_averaged() {
        let originals = vec![draft("Email de carrinho", 1), draft("Cupom relâmpago", 2), draft("Kit presente", 3)];
        let out = review(
            Some(json!({
                "approved_suggestions": [
                    {"original_title": "kit presente", "final_version": {"title": "Kits de presente para o Natal", "expected_impact": "alto"}, "quality_score": 9},
                    {"original_title": "Email de carrinho", "quality_score": 7},
                ],
                "removed_suggestions": [{"title": "Cupom relâmpago", "reason": "genérico demais"}],
                "observations": ["boa base"],
            })),
            &originals,
        );

        assert_eq!(out.approved.len(), 2);
        assert_eq!(out.approved[0].title, "Email de carrinho");
        assert_eq!(out.approved[1].title, "Kits de presente para o Natal");
        assert_eq!(out.approved[1].expected_impact, ExpectedImpact::High);
        assert_eq!(out.approved[1].description, "Kit presente description");
        assert_eq!(out.removed, vec![RemovedSuggestion {
            title: "Cupom relâmpago".to_string(),
            reason: "genérico demais".to_string(),
        }]);
        let obs = &out.observations;
        assert_eq!((obs.total_received, obs.total_approved, obs.total_removed), (3, 2, 1));
        assert!((obs.average_quality - 8.0).abs() < 1e-9);
        assert!(obs.critic_available);
        assert_eq!(obs.notes, vec!["boa base"]);
    }

    #[test]
    fn test_zero_approved_still_reports_observations() {
        let originals = vec![draft("A", 1), draft("B", 2)];
        let out = review(Some(json!({"approved_suggestions": []})), &originals);
        assert!(out.approved.is_empty());
        assert_eq!(out.removed.len(), 2);
        assert_eq!(out.removed[0].reason, NOT_APPROVED_REASON);
        assert_eq!(out.observations.total_removed, 2);
        assert_eq!(out.observations.average_quality, 0.0);
    }

    #[test]
    fn test_match_by_index() {
        let originals = vec![draft("A", 1), draft("B", 2)];
        let out = review(
            Some(json!({"approved_suggestions": [{"index": 1, "quality_score": "6"}]})),
            &originals,
        );
        assert_eq!(out.approved.len(), 1);
        assert_eq!(out.approved[0].title, "B");
        assert_eq!(out.approved[0].quality_score, Some(6.0));
    }

    #[test]
    fn test_invalid_final_version_falls_back_to_original() {
        let originals = vec![draft("A", 1)];
        let out = review(
            Some(json!({"approved_suggestions": [{"original_title": "A", "final_version": {"description": ""}}]})),
            &originals,
        );
        assert_eq!(out.approved[0].description, "A description");
    }

    #[test]
    fn test_unusable_unmatched_entry_is_recorded_as_removed() {
        let originals = vec![draft("A", 1), draft("B", 2)];
        let out = review(
            Some(json!({"approved_suggestions": [
                {"original_title": "A", "quality_score": 8},
                {"original_title": "Ideia nova", "final_version": {"description": "sem título"}},
                {"index": 7},
            ], "removed_suggestions": [{"title": "B", "reason": "vaga"}]})),
            &originals,
        );

        assert_eq!(out.approved.len(), 1);
        let unmatched: Vec<&RemovedSuggestion> =
            out.removed.iter().filter(|r| r.reason == UNMATCHED_REASON).collect();
        assert_eq!(unmatched.len(), 2);
        assert_eq!(unmatched[0].title, "Ideia nova");
        assert_eq!(unmatched[1].title, "entry 3");

        let obs = &out.observations;
        assert_eq!((obs.total_received, obs.total_approved, obs.total_removed), (4, 1, 3));
        assert_eq!(obs.total_received, obs.total_approved + obs.total_removed);
    }

    #[test]
    fn test_unparseable_output_passes_through() {
        let originals = vec![draft("A", 1), draft("B", 2)];
        let out = review(None, &originals);
        assert_eq!(out.approved, originals);
        assert!(!out.observations.critic_available);
        assert_eq!(out.observations.total_approved, 2);
        assert_eq!(out.observations.total_removed, 0);
    }
}

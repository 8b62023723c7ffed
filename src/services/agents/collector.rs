//! Collector agent: condenses metrics, history and benchmarks into a brief.

use serde::Serialize;
use serde_json::{json, Value};

use super::{string_field, string_list, AgentRuntime, AgentTuning};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AnalysisPeriod, CollectorOutput, KnowledgeHit, NicheBenchmarks, NicheMatch, PreviousAnalysis,
    PreviousSuggestion, Store, StoreMetrics,
};
use crate::domain::ports::PromptKind;

const TUNING: AgentTuning = AgentTuning::new(0.3, 2048);

/// Gap reported when the collector response could not be used.
pub const COLLECTOR_UNAVAILABLE_GAP: &str = "collector_output_unavailable";

#[derive(Debug, Clone, Serialize)]
pub struct CollectorInput<'a> {
    pub store: &'a Store,
    pub period: &'a AnalysisPeriod,
    pub niche: &'a NicheMatch,
    pub metrics: &'a StoreMetrics,
    pub benchmarks: Option<&'a NicheBenchmarks>,
    pub documents: &'a [KnowledgeHit],
    pub previous_suggestions: &'a [PreviousSuggestion],
    pub previous_analyses: &'a [PreviousAnalysis],
    /// Extra fields the analysis module wants emphasised.
    pub focus: &'a [String],
}

pub struct CollectorAgent {
    runtime: AgentRuntime,
}

impl CollectorAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub async fn run(&self, input: &CollectorInput<'_>) -> DomainResult<CollectorOutput> {
        let extracted = self.runtime.call(PromptKind::Collector, input, TUNING).await?;
        Ok(normalize(extracted, input.metrics))
    }
}

/// Shape the collector response, or the default brief when there is none.
///
/// The default has an empty summary and a single data gap naming the missing
/// collector output.
pub fn normalize(extracted: Option<Value>, metrics: &StoreMetrics) -> CollectorOutput {
    let Some(raw) = extracted.filter(Value::is_object) else {
        return CollectorOutput {
            metrics: metrics.clone(),
            profile: None,
            summary: String::new(),
            key_facts: Vec::new(),
            historical_insights: Vec::new(),
            data_gaps: vec![COLLECTOR_UNAVAILABLE_GAP.to_string()],
            context: json!({
                "summary": "",
                "key_facts": [],
                "historical_insights": [],
                "data_gaps": [COLLECTOR_UNAVAILABLE_GAP],
            }),
            degraded: true,
        };
    };

    let summary = string_field(&raw, "summary");
    let key_facts = string_list(&raw, "key_facts");
    let historical_insights = string_list(&raw, "historical_insights");
    let data_gaps = string_list(&raw, "data_gaps");

    let mut context = raw;
    if let Value::Object(map) = &mut context {
        map.insert("summary".into(), json!(summary));
        map.insert("key_facts".into(), json!(key_facts));
        map.insert("historical_insights".into(), json!(historical_insights));
        map.insert("data_gaps".into(), json!(data_gaps));
    }

    CollectorOutput {
        metrics: metrics.clone(),
        profile: None,
        summary,
        key_facts,
        historical_insights,
        data_gaps,
        context,
        degraded: false,
    }
}

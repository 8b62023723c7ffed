//! Pipeline stages and the append-only context threaded through them.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

use super::analysis::{Alert, HealthSummary, Opportunity, PreviousAnalysis};
use super::knowledge::{KnowledgeHit, NicheMatch};
use super::metrics::StoreMetrics;
use super::niche::NicheBenchmarks;
use super::suggestion::{PreviousSuggestion, SuggestionDraft};

/// Stages of the full pipeline, in execution order. The lite pipeline runs a
/// subset of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    NicheIdentification,
    HistoricalContextLoad,
    BenchmarkRetrieval,
    Collector,
    Analyst,
    Strategist,
    Critic,
    SimilarityFilter,
    Persist,
}

impl PipelineStage {
    pub const FULL: [PipelineStage; 9] = [
        PipelineStage::NicheIdentification,
        PipelineStage::HistoricalContextLoad,
        PipelineStage::BenchmarkRetrieval,
        PipelineStage::Collector,
        PipelineStage::Analyst,
        PipelineStage::Strategist,
        PipelineStage::Critic,
        PipelineStage::SimilarityFilter,
        PipelineStage::Persist,
    ];

    pub const LITE: [PipelineStage; 4] = [
        PipelineStage::NicheIdentification,
        PipelineStage::Analyst,
        PipelineStage::Strategist,
        PipelineStage::Persist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::NicheIdentification => "niche_identification",
            PipelineStage::HistoricalContextLoad => "historical_context_load",
            PipelineStage::BenchmarkRetrieval => "benchmark_retrieval",
            PipelineStage::Collector => "collector",
            PipelineStage::Analyst => "analyst",
            PipelineStage::Strategist => "strategist",
            PipelineStage::Critic => "critic",
            PipelineStage::SimilarityFilter => "similarity_filter",
            PipelineStage::Persist => "persist",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::FULL.into_iter().find(|stage| stage.as_str() == s)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prior analyses and suggestions for the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalContext {
    pub previous_suggestions: Vec<PreviousSuggestion>,
    pub previous_analyses: Vec<PreviousAnalysis>,
}

/// Benchmark table and retrieved documents for the store's niche.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkContext {
    pub benchmarks: Option<NicheBenchmarks>,
    pub documents: Vec<KnowledgeHit>,
}

/// Synthesized store positioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreProfile {
    pub positioning: String,
    pub target_audience: String,
    pub price_tier: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    #[serde(skip_deserializing)]
    pub degraded: bool,
}

impl Default for StoreProfile {
    fn default() -> Self {
        Self {
            positioning: String::new(),
            target_audience: String::new(),
            price_tier: "unknown".to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            degraded: false,
        }
    }
}

/// Collector stage output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectorOutput {
    pub metrics: StoreMetrics,
    pub profile: Option<StoreProfile>,
    pub summary: String,
    pub key_facts: Vec<String>,
    pub historical_insights: Vec<String>,
    pub data_gaps: Vec<String>,
    /// Full normalized collector payload.
    pub context: serde_json::Value,
    pub degraded: bool,
}

/// Analyst stage output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystOutput {
    /// Metrics object merged over the default skeleton.
    pub metrics: serde_json::Value,
    pub health: HealthSummary,
    pub alerts: Vec<Alert>,
    pub opportunities: Vec<Opportunity>,
    pub degraded: bool,
}

/// Strategist stage output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategistOutput {
    pub suggestions: Vec<SuggestionDraft>,
    /// Candidates dropped for missing required fields.
    pub discarded: usize,
    pub degraded: bool,
}

/// A suggestion the Critic removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedSuggestion {
    pub title: String,
    pub reason: String,
}

/// Critic bookkeeping, always populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticObservations {
    pub total_received: usize,
    pub total_approved: usize,
    pub total_removed: usize,
    pub average_quality: f64,
    pub critic_available: bool,
    pub notes: Vec<String>,
}

/// Critic stage output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticOutput {
    pub approved: Vec<SuggestionDraft>,
    pub removed: Vec<RemovedSuggestion>,
    pub observations: CriticObservations,
}

/// A suggestion that passed the similarity gate, with its embedding if one
/// could be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSuggestion {
    pub draft: SuggestionDraft,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// A suggestion rejected as a near-duplicate of a stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateSuggestion {
    pub title: String,
    pub similarity: f32,
}

/// Similarity filter output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityOutput {
    pub kept: Vec<FilteredSuggestion>,
    pub duplicates: Vec<DuplicateSuggestion>,
    /// Checks that could not run and defaulted to keeping the suggestion.
    pub unchecked: usize,
}

/// Accumulator for one run. Each slot is written exactly once, by its own
/// stage; writing an occupied slot is an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineContext {
    niche: Option<NicheMatch>,
    history: Option<HistoricalContext>,
    benchmarks: Option<BenchmarkContext>,
    collector: Option<CollectorOutput>,
    analyst: Option<AnalystOutput>,
    strategist: Option<StrategistOutput>,
    critic: Option<CriticOutput>,
    similarity: Option<SimilarityOutput>,
    completed: Vec<PipelineStage>,
}

fn fill<T>(slot: &mut Option<T>, value: T, stage: PipelineStage) -> DomainResult<()> {
    if slot.is_some() {
        return Err(DomainError::ValidationFailed(format!(
            "output of stage {} already recorded",
            stage
        )));
    }
    *slot = Some(value);
    Ok(())
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn niche(&self) -> Option<&NicheMatch> {
        self.niche.as_ref()
    }

    pub fn history(&self) -> Option<&HistoricalContext> {
        self.history.as_ref()
    }

    pub fn benchmarks(&self) -> Option<&BenchmarkContext> {
        self.benchmarks.as_ref()
    }

    pub fn collector(&self) -> Option<&CollectorOutput> {
        self.collector.as_ref()
    }

    pub fn analyst(&self) -> Option<&AnalystOutput> {
        self.analyst.as_ref()
    }

    pub fn strategist(&self) -> Option<&StrategistOutput> {
        self.strategist.as_ref()
    }

    pub fn critic(&self) -> Option<&CriticOutput> {
        self.critic.as_ref()
    }

    pub fn similarity(&self) -> Option<&SimilarityOutput> {
        self.similarity.as_ref()
    }

    pub fn completed_stages(&self) -> &[PipelineStage] {
        &self.completed
    }

    pub fn record_niche(&mut self, value: NicheMatch) -> DomainResult<()> {
        fill(&mut self.niche, value, PipelineStage::NicheIdentification)?;
        self.completed.push(PipelineStage::NicheIdentification);
        Ok(())
    }

    pub fn record_history(&mut self, value: HistoricalContext) -> DomainResult<()> {
        fill(&mut self.history, value, PipelineStage::HistoricalContextLoad)?;
        self.completed.push(PipelineStage::HistoricalContextLoad);
        Ok(())
    }

    pub fn record_benchmarks(&mut self, value: BenchmarkContext) -> DomainResult<()> {
        fill(&mut self.benchmarks, value, PipelineStage::BenchmarkRetrieval)?;
        self.completed.push(PipelineStage::BenchmarkRetrieval);
        Ok(())
    }

    pub fn record_collector(&mut self, value: CollectorOutput) -> DomainResult<()> {
        fill(&mut self.collector, value, PipelineStage::Collector)?;
        self.completed.push(PipelineStage::Collector);
        Ok(())
    }

    pub fn record_analyst(&mut self, value: AnalystOutput) -> DomainResult<()> {
        fill(&mut self.analyst, value, PipelineStage::Analyst)?;
        self.completed.push(PipelineStage::Analyst);
        Ok(())
    }

    pub fn record_strategist(&mut self, value: StrategistOutput) -> DomainResult<()> {
        fill(&mut self.strategist, value, PipelineStage::Strategist)?;
        self.completed.push(PipelineStage::Strategist);
        Ok(())
    }

    pub fn record_critic(&mut self, value: CriticOutput) -> DomainResult<()> {
        fill(&mut self.critic, value, PipelineStage::Critic)?;
        self.completed.push(PipelineStage::Critic);
        Ok(())
    }

    pub fn record_similarity(&mut self, value: SimilarityOutput) -> DomainResult<()> {
        fill(&mut self.similarity, value, PipelineStage::SimilarityFilter)?;
        self.completed.push(PipelineStage::SimilarityFilter);
        Ok(())
    }

    /// Name of the resolved niche, or `general`.
    pub fn niche_key(&self) -> &str {
        self.niche
            .as_ref()
            .map(|n| n.niche.as_str())
            .unwrap_or(super::knowledge::GENERAL_NICHE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_round_trip() {
        for stage in PipelineStage::FULL {
            assert_eq!(PipelineStage::from_str(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn test_context_slots_are_write_once() {
        let mut ctx = PipelineContext::new();
        ctx.record_niche(NicheMatch::general()).unwrap();
        let second = ctx.record_niche(NicheMatch::general());
        assert!(second.is_err());
        assert_eq!(ctx.completed_stages(), &[PipelineStage::NicheIdentification]);
    }

    #[test]
    fn test_niche_key_defaults_to_general() {
        let ctx = PipelineContext::new();
        assert_eq!(ctx.niche_key(), "general");
    }
}

//! Analysis pipelines.
//!
//! Both variants run their stages strictly in order. Each stage runs inside a
//! `pipeline_stage` span under a stage-level timeout, its output is
//! checkpointed through [`AnalysisRepository::save_stage_data`], and a failing
//! stage marks the analysis failed before the error is returned. Suggestions
//! are written once, in the final `persist` stage.

pub mod full;
pub mod lite;

pub use full::FullPipeline;
pub use lite::LitePipeline;

use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult, PipelineError};
use crate::domain::models::{
    AnalysisResult, KnowledgeCategory, KnowledgeHit, NicheMatch, PipelineConfig, PipelineStage,
    PreviousAnalysis, PreviousSuggestion, Suggestion, SuggestionDraft,
};
use crate::domain::ports::{
    AiProvider, AnalysisRepository, EmbeddingProvider, PromptTemplates, StoreMetricsProvider,
    SuggestionVectorStore,
};
use crate::services::agents::AgentRuntime;
use crate::services::knowledge_base::KnowledgeBase;

/// Collaborators shared by both pipeline variants.
#[derive(Clone)]
pub struct PipelineServices {
    pub provider: Arc<dyn AiProvider>,
    pub prompts: Arc<dyn PromptTemplates>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub repository: Arc<dyn AnalysisRepository>,
    pub vector_store: Arc<dyn SuggestionVectorStore>,
    pub knowledge: Arc<KnowledgeBase>,
    pub metrics: Arc<dyn StoreMetricsProvider>,
    pub config: PipelineConfig,
}

impl PipelineServices {
    pub(crate) fn runtime(&self) -> AgentRuntime {
        AgentRuntime::new(self.provider.clone(), self.prompts.clone())
    }

    pub(crate) fn stage_runner(&self, analysis_id: Uuid) -> StageRunner<'_> {
        StageRunner {
            repository: self.repository.as_ref(),
            analysis_id,
            timeout: Duration::from_secs(self.config.stage_timeout_secs),
        }
    }

    /// Knowledge lookup that only aborts on errors of the aborting classes.
    pub(crate) async fn search_knowledge(
        &self,
        query: &str,
        category: KnowledgeCategory,
        niche: &NicheMatch,
    ) -> DomainResult<Vec<KnowledgeHit>> {
        match self
            .knowledge
            .search(
                query,
                category,
                Some(&niche.niche),
                Some(&niche.subcategory),
                self.config.knowledge_results,
            )
            .await
        {
            Ok(hits) => Ok(hits),
            Err(e) if e.aborts_pipeline() => Err(e),
            Err(e) => {
                tracing::warn!(
                    category = category.as_str(),
                    error = %e,
                    "Knowledge search failed, continuing without documents"
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Runs one stage of one analysis.
pub(crate) struct StageRunner<'a> {
    repository: &'a dyn AnalysisRepository,
    analysis_id: Uuid,
    timeout: Duration,
}

impl StageRunner<'_> {
    /// Move the analysis to `processing`. Failures are attributed to `first`.
    pub async fn start(&self, first: PipelineStage) -> Result<(), PipelineError> {
        let result = self.repository.mark_processing(self.analysis_id).await;
        self.check(first, result).await
    }

    pub async fn run<T, F>(&self, stage: PipelineStage, work: F) -> Result<T, PipelineError>
    where
        T: Serialize,
        F: Future<Output = DomainResult<T>>,
    {
        let span = tracing::info_span!(
            "pipeline_stage",
            stage = stage.as_str(),
            analysis_id = %self.analysis_id
        );

        async {
            let started = Instant::now();
            let result = match timeout(self.timeout, work).await {
                Ok(result) => result,
                Err(_) => Err(DomainError::StageTimeout {
                    seconds: self.timeout.as_secs(),
                }),
            };

            match result {
                Ok(output) => {
                    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Stage completed");
                    self.checkpoint(stage, &output).await;
                    Ok(output)
                }
                Err(e) => self.fail(stage, e).await,
            }
        }
        .instrument(span)
        .await
    }

    /// Convert a domain result into a stage failure.
    pub async fn check<T>(&self, stage: PipelineStage, result: DomainResult<T>) -> Result<T, PipelineError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => self.fail(stage, e).await,
        }
    }

    async fn checkpoint<T: Serialize>(&self, stage: PipelineStage, output: &T) {
        let data = match serde_json::to_value(output) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Stage output not serializable, skipping checkpoint");
                return;
            }
        };
        if let Err(e) = self.repository.save_stage_data(self.analysis_id, stage, &data).await {
            tracing::warn!(error = %e, "Failed to save stage data");
        }
    }

    async fn fail<T>(&self, stage: PipelineStage, error: DomainError) -> Result<T, PipelineError> {
        tracing::error!(stage = stage.as_str(), error = %error, "Pipeline stage failed");
        if let Err(e) = self
            .repository
            .mark_failed(self.analysis_id, stage, &error.to_string())
            .await
        {
            tracing::error!(error = %e, "Failed to mark analysis as failed");
        }
        Err(PipelineError::new(stage, error))
    }
}

/// Merge caller-supplied history with stored history.
///
/// Suggestions are deduplicated by case-insensitive title and analyses by id;
/// caller-supplied entries come first.
pub(crate) fn merge_history(
    provided_suggestions: &[PreviousSuggestion],
    stored_suggestions: Vec<PreviousSuggestion>,
    provided_analyses: &[PreviousAnalysis],
    stored_analyses: Vec<PreviousAnalysis>,
) -> (Vec<PreviousSuggestion>, Vec<PreviousAnalysis>) {
    let mut seen_titles = HashSet::new();
    let suggestions = provided_suggestions
        .iter()
        .cloned()
        .chain(stored_suggestions)
        .filter(|s| seen_titles.insert(s.title.trim().to_lowercase()))
        .collect();

    let mut seen_ids = HashSet::new();
    let analyses = provided_analyses
        .iter()
        .cloned()
        .chain(stored_analyses)
        .filter(|a| seen_ids.insert(a.id))
        .collect();

    (suggestions, analyses)
}

/// Build suggestion records and complete the analysis in one write.
pub(crate) async fn persist(
    repository: &dyn AnalysisRepository,
    analysis_id: Uuid,
    store_id: Uuid,
    result: &AnalysisResult,
    drafts: Vec<(SuggestionDraft, Option<Vec<f32>>)>,
    max_suggestions: usize,
) -> DomainResult<Vec<Suggestion>> {
    let mut suggestions = Vec::with_capacity(drafts.len().min(max_suggestions));
    for (draft, embedding) in drafts.into_iter().take(max_suggestions) {
        match Suggestion::from_draft(draft, analysis_id, store_id, embedding) {
            Ok(suggestion) => suggestions.push(suggestion),
            Err(e) => tracing::warn!(error = %e, "Skipping invalid suggestion"),
        }
    }

    repository.complete(analysis_id, result, &suggestions).await?;
    tracing::info!(
        suggestions = suggestions.len(),
        health_score = result.health.score,
        "Analysis persisted"
    );
    Ok(suggestions)
}

/// What the `persist` stage checkpoints.
#[derive(Debug, Serialize)]
pub(crate) struct PersistSummary {
    pub suggestion_ids: Vec<Uuid>,
}

impl PersistSummary {
    pub fn from_suggestions(suggestions: &[Suggestion]) -> Self {
        Self {
            suggestion_ids: suggestions.iter().map(|s| s.id).collect(),
        }
    }
}

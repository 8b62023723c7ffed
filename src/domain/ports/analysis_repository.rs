use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AnalysisRecord, AnalysisResult, PipelineStage, PreviousAnalysis, PreviousSuggestion, Suggestion,
};

/// Persistence of analyses and their suggestions.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn create(&self, record: &AnalysisRecord) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<AnalysisRecord>>;

    async fn mark_processing(&self, id: Uuid) -> DomainResult<()>;

    /// Store one stage's output so an external runner can resume.
    async fn save_stage_data(
        &self,
        id: Uuid,
        stage: PipelineStage,
        data: &serde_json::Value,
    ) -> DomainResult<()>;

    /// Write the analysis summary and every suggestion atomically.
    ///
    /// Either the analysis is marked completed with all suggestions, or
    /// nothing is written.
    async fn complete(
        &self,
        id: Uuid,
        result: &AnalysisResult,
        suggestions: &[Suggestion],
    ) -> DomainResult<()>;

    async fn mark_failed(&self, id: Uuid, stage: PipelineStage, message: &str) -> DomainResult<()>;

    /// Most recent suggestions for a store, newest first.
    async fn recent_suggestions(
        &self,
        store_id: Uuid,
        limit: usize,
    ) -> DomainResult<Vec<PreviousSuggestion>>;

    /// Most recent completed analyses for a store, newest first.
    async fn recent_analyses(
        &self,
        store_id: Uuid,
        exclude: Uuid,
        limit: usize,
    ) -> DomainResult<Vec<PreviousAnalysis>>;

    /// Suggestions persisted by one analysis, in priority order.
    async fn suggestions_for(&self, analysis_id: Uuid) -> DomainResult<Vec<Suggestion>>;
}

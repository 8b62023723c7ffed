//! Domain errors for the storelens analysis pipeline.

use thiserror::Error;
use uuid::Uuid;

use super::models::PipelineStage;

/// Domain-level errors that can occur while analysing a store.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("AI provider '{provider}' failed: {message}")]
    ProviderFailed {
        provider: String,
        message: String,
        transient: bool,
    },

    #[error("AI provider '{0}' is not configured (missing credentials)")]
    ProviderNotConfigured(String),

    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(Uuid),

    #[error("Stage timed out after {seconds}s")]
    StageTimeout { seconds: u64 },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Build a provider failure.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>, transient: bool) -> Self {
        DomainError::ProviderFailed {
            provider: provider.into(),
            message: message.into(),
            transient,
        }
    }

    /// Whether a retry of the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::ProviderFailed { transient: true, .. })
    }

    /// Whether this error must abort a pipeline run instead of degrading.
    pub fn aborts_pipeline(&self) -> bool {
        matches!(
            self,
            DomainError::ProviderFailed { .. }
                | DomainError::ProviderNotConfigured(_)
                | DomainError::UnknownProvider(_)
                | DomainError::StageTimeout { .. }
                | DomainError::DatabaseError(_)
                | DomainError::AnalysisNotFound(_)
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// A pipeline run that stopped at a specific stage.
#[derive(Debug, Error)]
#[error("Pipeline failed at stage {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: DomainError,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: DomainError) -> Self {
        Self { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_only_for_flagged_provider_errors() {
        assert!(DomainError::provider("openai", "503", true).is_transient());
        assert!(!DomainError::provider("openai", "401", false).is_transient());
        assert!(!DomainError::EmbeddingFailed("down".into()).is_transient());
    }

    #[test]
    fn test_abort_classes() {
        assert!(DomainError::ProviderNotConfigured("gemini".into()).aborts_pipeline());
        assert!(DomainError::StageTimeout { seconds: 5 }.aborts_pipeline());
        assert!(!DomainError::EmbeddingFailed("x".into()).aborts_pipeline());
        assert!(!DomainError::ValidationFailed("x".into()).aborts_pipeline());
    }

    #[test]
    fn test_pipeline_error_names_stage() {
        let err = PipelineError::new(
            PipelineStage::Analyst,
            DomainError::provider("anthropic", "boom", false),
        );
        let msg = err.to_string();
        assert!(msg.contains("analyst"));
        assert!(msg.contains("boom"));
    }
}

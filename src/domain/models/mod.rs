pub mod analysis;
pub mod chat;
pub mod config;
pub mod knowledge;
pub mod metrics;
pub mod module_config;
pub mod niche;
pub mod pipeline;
pub mod suggestion;
pub mod vector;

pub use analysis::{
    Alert, AnalysisOutcome, AnalysisPeriod, AnalysisRecord, AnalysisRequest, AnalysisResult,
    AnalysisStatus, HealthClassification, HealthSummary, Opportunity, PipelineKind,
    PreviousAnalysis, Store, DEFAULT_HEALTH_SCORE, MAX_LOOKBACK_DAYS,
};
pub use chat::{ChatMessage, ChatOptions, ChatRole};
pub use config::{
    AiConfig, Config, DatabaseConfig, EmbeddingsConfig, KnowledgeConfig, LoggingConfig,
    PipelineConfig, ProviderSettings, RateLimitConfig, RetryConfig,
};
pub use knowledge::{
    KnowledgeCategory, KnowledgeDocument, KnowledgeHit, NicheMatch, NicheSource, GENERAL_NICHE,
};
pub use metrics::StoreMetrics;
pub use module_config::{AnalysisType, ModuleConfig};
pub use niche::{NicheBenchmarks, NicheCatalog, NicheProfile, Range, SubcategoryProfile};
pub use pipeline::{
    AnalystOutput, BenchmarkContext, CollectorOutput, CriticObservations, CriticOutput,
    DuplicateSuggestion, FilteredSuggestion, HistoricalContext, PipelineContext, PipelineStage,
    RemovedSuggestion, SimilarityOutput, StoreProfile, StrategistOutput,
};
pub use suggestion::{
    ExpectedImpact, PreviousSuggestion, Suggestion, SuggestionCategory, SuggestionDraft,
    SuggestionStatus,
};

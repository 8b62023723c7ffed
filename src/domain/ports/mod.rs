//! Port trait definitions (Hexagonal Architecture)
//!
//! Async traits the services depend on and adapters implement:
//! - AiProvider: chat completion backends
//! - EmbeddingProvider: text to vector
//! - SuggestionVectorStore: nearest stored suggestion per store
//! - KnowledgeRepository: benchmark/strategy/case documents
//! - AnalysisRepository: analyses and suggestions
//! - StoreMetricsProvider: aggregated store statistics
//! - PromptTemplates: opaque prompt producer

pub mod ai_provider;
pub mod analysis_repository;
pub mod embedding;
pub mod knowledge_repository;
pub mod null_embedding;
pub mod prompts;
pub mod store_metrics;
pub mod vector_store;

pub use ai_provider::AiProvider;
pub use analysis_repository::AnalysisRepository;
pub use embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use knowledge_repository::{KnowledgeRepository, KnowledgeVectorQuery};
pub use null_embedding::NullEmbeddingProvider;
pub use prompts::{PromptKind, PromptTemplates, RenderedPrompt};
pub use store_metrics::StoreMetricsProvider;
pub use vector_store::{NearestMatch, SuggestionVectorStore};

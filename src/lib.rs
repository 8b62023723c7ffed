//! StoreLens - multi-agent e-commerce store analysis
//!
//! StoreLens turns a store's aggregated metrics into a health assessment and
//! a short, ranked list of actionable suggestions. A chain of LLM agents
//! (collector, analyst, strategist, critic) runs over niche benchmarks and a
//! knowledge base, and near-duplicates of earlier suggestions are filtered
//! out by embedding similarity before anything is persisted.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, port traits and errors
//! - **Adapters** (`adapters`): AI providers, embeddings, SQLite, metrics sources
//! - **Service Layer** (`services`): agents, pipelines, knowledge base, JSON recovery
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use storelens::services::{FullPipeline, PipelineServices};
//!
//! async fn run(services: PipelineServices, store: &Store, record: &AnalysisRecord) {
//!     let outcome = FullPipeline::new(services).run_full(store, record).await?;
//!     println!("health {}", outcome.overall_health.score);
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult, PipelineError};
pub use domain::models::{
    AnalysisOutcome, AnalysisRecord, AnalysisRequest, Config, ExpectedImpact, PipelineStage, Store,
    StoreMetrics, Suggestion,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AnalysisRouter, FullPipeline, JsonExtractor, KnowledgeBase, LitePipeline, PipelineServices,
};

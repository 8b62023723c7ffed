//! Application services: extraction, retrieval, agents and pipelines.

pub mod agents;
pub mod analysis_router;
pub mod json_extractor;
pub mod knowledge_base;
pub mod pipeline;
pub mod prompts;
pub mod similarity_service;

pub use analysis_router::AnalysisRouter;
pub use json_extractor::{Extraction, ExtractionStrategy, JsonExtractor};
pub use knowledge_base::{ImportReport, KnowledgeBase};
pub use pipeline::{FullPipeline, LitePipeline, PipelineServices};
pub use prompts::DefaultPromptTemplates;
pub use similarity_service::SimilarityService;

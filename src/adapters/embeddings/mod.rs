//! Embedding provider adapters.

pub mod gemini;
pub mod openai;

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingsConfig;
use crate::domain::ports::{EmbeddingProvider, NullEmbeddingProvider};

pub use gemini::GeminiEmbeddingProvider;
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};

/// Build the embedding provider named by `embeddings.provider`.
pub fn from_config(settings: &EmbeddingsConfig) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.trim().to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbeddingProvider::new(
            OpenAiEmbeddingConfig::from_settings(settings),
        )?)),
        "gemini" => Ok(Arc::new(GeminiEmbeddingProvider::new(settings)?)),
        "none" | "null" | "" => Ok(Arc::new(NullEmbeddingProvider::new())),
        other => Err(DomainError::ValidationFailed(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

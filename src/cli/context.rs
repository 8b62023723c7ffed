//! Wiring of adapters and services for CLI commands.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::embeddings;
use crate::adapters::metrics::JsonFileMetricsProvider;
use crate::adapters::providers::{GuardedProvider, ProviderRouter};
use crate::adapters::sqlite::{
    database_url, initialize_database, PoolConfig, SqliteAnalysisRepository, SqliteKnowledgeRepository,
};
use crate::domain::models::{Config, NicheCatalog};
use crate::domain::ports::{AiProvider, EmbeddingProvider};
use crate::services::{DefaultPromptTemplates, KnowledgeBase, PipelineServices};

/// Storage and retrieval collaborators, without an AI provider.
pub struct AppContext {
    pub config: Config,
    pub analyses: Arc<SqliteAnalysisRepository>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub knowledge: Arc<KnowledgeBase>,
}

impl AppContext {
    pub async fn open(config: Config) -> Result<Self> {
        if let Some(parent) = Path::new(&config.database.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let pool_config = PoolConfig {
            max_connections: config.database.max_connections,
            ..PoolConfig::default()
        };
        let pool = initialize_database(&database_url(&config.database.path), Some(pool_config))
            .await
            .context("Failed to initialize database")?;

        let embedder = embeddings::from_config(&config.embeddings)?;
        let catalog = match &config.knowledge.niches_file {
            Some(path) => NicheCatalog::load(path)?,
            None => NicheCatalog::builtin()?,
        };
        let knowledge = Arc::new(KnowledgeBase::new(
            Arc::new(SqliteKnowledgeRepository::new(pool.clone())),
            embedder.clone(),
            Arc::new(catalog),
        ));

        Ok(Self {
            analyses: Arc::new(SqliteAnalysisRepository::new(pool)),
            embedder,
            knowledge,
            config,
        })
    }

    /// The configured provider behind rate limiting and retries.
    pub fn provider(&self) -> Result<Arc<dyn AiProvider>> {
        let inner = ProviderRouter::from_config(&self.config.ai)?.active()?;
        Ok(Arc::new(GuardedProvider::new(
            inner,
            &self.config.rate_limit,
            &self.config.retry,
        )))
    }

    pub fn pipeline_services(&self, metrics_file: &Path) -> Result<PipelineServices> {
        Ok(PipelineServices {
            provider: self.provider()?,
            prompts: Arc::new(DefaultPromptTemplates::new()),
            embedder: self.embedder.clone(),
            repository: self.analyses.clone(),
            vector_store: self.analyses.clone(),
            knowledge: self.knowledge.clone(),
            metrics: Arc::new(JsonFileMetricsProvider::new(metrics_file)),
            config: self.config.pipeline.clone(),
        })
    }
}

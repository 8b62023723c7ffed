use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{KnowledgeCategory, KnowledgeDocument, KnowledgeHit};

/// Filter for vector search over knowledge documents.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeVectorQuery {
    pub category: Option<KnowledgeCategory>,
    /// Restrict to these niches; empty means any niche.
    pub niches: Vec<String>,
    /// Skip documents in the `general` niche.
    pub exclude_general: bool,
    pub limit: usize,
}

/// Storage for benchmark, strategy and case documents.
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Insert a document with an optional embedding.
    async fn insert(&self, document: &KnowledgeDocument, embedding: Option<&[f32]>)
        -> DomainResult<()>;

    /// Number of documents in `category` that carry an embedding.
    async fn count_embedded(&self, category: KnowledgeCategory) -> DomainResult<u64>;

    /// Documents closest to `vector`, relevance = 1 - distance, best first.
    async fn nearest(&self, query: &KnowledgeVectorQuery, vector: &[f32])
        -> DomainResult<Vec<KnowledgeHit>>;

    /// Attribute-only lookup.
    ///
    /// Exact niche matches come before `general` documents, and within each
    /// group exact subcategory matches come first. Relevance is always 1.0.
    async fn find_by_attributes(
        &self,
        category: KnowledgeCategory,
        niche: Option<&str>,
        subcategory: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<KnowledgeHit>>;
}

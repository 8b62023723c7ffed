//! Nearest-neighbour lookup over stored suggestion embeddings.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Closest stored vector within a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
    /// Identifier of the stored item.
    pub id: String,
    /// Cosine distance, `1 - similarity`.
    pub distance: f32,
}

/// Read-only vector lookup scoped to one owner (a store).
///
/// Vectors from different scopes are never compared.
#[async_trait]
pub trait SuggestionVectorStore: Send + Sync {
    /// Closest stored vector in `scope_id`, or `None` when the scope has none.
    async fn nearest(&self, scope_id: &str, vector: &[f32]) -> DomainResult<Option<NearestMatch>>;
}

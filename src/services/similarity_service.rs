//! Semantic deduplication of suggestions against a store's earlier ones.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::vector;
use crate::domain::models::{DuplicateSuggestion, FilteredSuggestion, SimilarityOutput, SuggestionDraft};
use crate::domain::ports::{EmbeddingProvider, SuggestionVectorStore};

/// Embeds suggestion text and compares it with stored suggestion vectors.
///
/// Only vectors from the same scope (store) are ever compared. When a check
/// cannot run, the suggestion is kept.
pub struct SimilarityService {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn SuggestionVectorStore>,
}

impl SimilarityService {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn SuggestionVectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn is_available(&self) -> bool {
        self.embedder.is_available()
    }

    pub async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.embedder.embed(text).await
    }

    pub async fn embed_for_query(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.embedder.embed_for_query(text).await
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> DomainResult<f32> {
        vector::cosine_similarity(a, b)
    }

    /// Similarity to the nearest stored vector in `scope_id`, if any.
    pub async fn nearest_similarity(&self, vector: &[f32], scope_id: &str) -> DomainResult<Option<f32>> {
        let nearest = self.store.nearest(scope_id, vector).await?;
        Ok(nearest.map(|m| 1.0 - m.distance))
    }

    /// True iff the nearest stored vector in `scope_id` is strictly more
    /// similar than `threshold`.
    pub async fn is_too_similar(&self, vector: &[f32], scope_id: &str, threshold: f32) -> DomainResult<bool> {
        Ok(self
            .nearest_similarity(vector, scope_id)
            .await?
            .is_some_and(|similarity| similarity > threshold))
    }

    /// Drop drafts that repeat a stored suggestion. Never fails.
    pub async fn filter(&self, drafts: Vec<SuggestionDraft>, scope_id: &str, threshold: f32) -> SimilarityOutput {
        let mut output = SimilarityOutput::default();

        if !self.embedder.is_available() {
            tracing::info!(
                scope_id,
                count = drafts.len(),
                "Embeddings unavailable, keeping all suggestions unchecked"
            );
            output.unchecked = drafts.len();
            output.kept = drafts
                .into_iter()
                .map(|draft| FilteredSuggestion { draft, embedding: None })
                .collect();
            return output;
        }

        for draft in drafts {
            let embedding = match self.embedder.embed(&draft.similarity_text()).await {
                Ok(v) if !v.is_empty() => v,
                Ok(_) => {
                    output.unchecked += 1;
                    output.kept.push(FilteredSuggestion { draft, embedding: None });
                    continue;
                }
                Err(e) => {
                    tracing::warn!(scope_id, title = %draft.title, error = %e, "Embedding failed, keeping suggestion");
                    output.unchecked += 1;
                    output.kept.push(FilteredSuggestion { draft, embedding: None });
                    continue;
                }
            };

            match self.nearest_similarity(&embedding, scope_id).await {
                Ok(Some(similarity)) if similarity > threshold => {
                    tracing::info!(
                        scope_id,
                        title = %draft.title,
                        similarity,
                        threshold,
                        "Dropping near-duplicate suggestion"
                    );
                    output.duplicates.push(DuplicateSuggestion {
                        title: draft.title,
                        similarity,
                    });
                }
                Ok(_) => output.kept.push(FilteredSuggestion {
                    draft,
                    embedding: Some(embedding),
                }),
                Err(e) => {
                    tracing::warn!(scope_id, title = %draft.title, error = %e, "Similarity check failed, keeping suggestion");
                    output.unchecked += 1;
                    output.kept.push(FilteredSuggestion {
                        draft,
                        embedding: Some(embedding),
                    });
                }
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{ExpectedImpact, SuggestionCategory};
    use crate::domain::ports::{EmbeddingInput, EmbeddingOutput, NearestMatch, NullEmbeddingProvider};
    use async_trait::async_trait;

    /// Embeds by looking up a fixed table keyed by title.
    struct TableEmbedder(Vec<(&'static str, Vec<f32>)>);

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        fn name(&self) -> &'static str {
            "table"
        }
        fn dimension(&self) -> usize {
            2
        }
        async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
            self.0
                .iter()
                .find(|(key, _)| text.starts_with(key))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| DomainError::EmbeddingFailed(format!("no vector for {}", text)))
        }
        async fn embed_batch(&self, _inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
            Ok(Vec::new())
        }
        fn max_batch_size(&self) -> usize {
            1
        }
    }

    struct MemoryStore {
        scope: &'static str,
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl SuggestionVectorStore for MemoryStore {
        async fn nearest(&self, scope_id: &str, vector: &[f32]) -> DomainResult<Option<NearestMatch>> {
            if scope_id != self.scope {
                return Ok(None);
            }
            let mut best: Option<NearestMatch> = None;
            for (i, stored) in self.vectors.iter().enumerate() {
                let distance = vector::cosine_distance(vector, stored)?;
                if best.as_ref().map_or(true, |b| distance < b.distance) {
                    best = Some(NearestMatch { id: i.to_string(), distance });
                }
            }
            Ok(best)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl SuggestionVectorStore for BrokenStore {
        async fn nearest(&self, _scope_id: &str, _vector: &[f32]) -> DomainResult<Option<NearestMatch>> {
            Err(DomainError::DatabaseError("locked".into()))
        }
    }

    fn at_similarity(s: f32) -> Vec<f32> {
        vec![s, (1.0 - s * s).sqrt()]
    }

    fn draft(title: &str) -> SuggestionDraft {
        SuggestionDraft {
            category: SuggestionCategory::Marketing,
            title: title.to_string(),
            description: "desc".to_string(),
            recommended_action: "act".to_string(),
            expected_impact: ExpectedImpact::Medium,
            target_metrics: vec![],
            supporting_data: serde_json::Value::Null,
            justification: String::new(),
            priority: 1,
            quality_score: None,
        }
    }

    fn service(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn SuggestionVectorStore>) -> SimilarityService {
        SimilarityService::new(embedder, store)
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let store = Arc::new(MemoryStore {
            scope: "store-1",
            vectors: vec![vec![1.0, 0.0]],
        });
        let svc = service(Arc::new(TableEmbedder(vec![])), store);

        assert!(svc.is_too_similar(&at_similarity(0.90), "store-1", 0.85).await.unwrap());
        assert!(!svc.is_too_similar(&at_similarity(0.80), "store-1", 0.85).await.unwrap());
    }

    #[tokio::test]
    async fn test_other_scopes_are_never_compared() {
        let store = Arc::new(MemoryStore {
            scope: "store-1",
            vectors: vec![vec![1.0, 0.0]],
        });
        let svc = service(Arc::new(TableEmbedder(vec![])), store);
        assert!(!svc.is_too_similar(&[1.0, 0.0], "store-2", 0.85).await.unwrap());
    }

    #[tokio::test]
    async fn test_filter_drops_duplicates_and_keeps_embeddings() {
        let embedder = TableEmbedder(vec![
            ("Repeat", at_similarity(0.95)),
            ("Fresh", at_similarity(0.10)),
        ]);
        let store = Arc::new(MemoryStore {
            scope: "s",
            vectors: vec![vec![1.0, 0.0]],
        });
        let svc = service(Arc::new(embedder), store);

        let out = svc.filter(vec![draft("Repeat"), draft("Fresh")], "s", 0.85).await;

        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.kept[0].draft.title, "Fresh");
        assert!(out.kept[0].embedding.is_some());
        assert_eq!(out.duplicates.len(), 1);
        assert_eq!(out.duplicates[0].title, "Repeat");
        assert_eq!(out.unchecked, 0);
    }

    #[tokio::test]
    async fn test_filter_fails_open() {
        let embedder = TableEmbedder(vec![("Known", at_similarity(0.99))]);
        let svc = service(Arc::new(embedder), Arc::new(BrokenStore));

        // "Unknown" fails to embed, "Known" fails the store lookup.
        let out = svc.filter(vec![draft("Unknown"), draft("Known")], "s", 0.85).await;

        assert_eq!(out.kept.len(), 2);
        assert!(out.duplicates.is_empty());
        assert_eq!(out.unchecked, 2);
    }

    #[tokio::test]
    async fn test_filter_without_embeddings_keeps_everything() {
        let svc = service(Arc::new(NullEmbeddingProvider::new()), Arc::new(BrokenStore));
        let out = svc.filter(vec![draft("a"), draft("b")], "s", 0.85).await;
        assert_eq!(out.kept.len(), 2);
        assert_eq!(out.unchecked, 2);
        assert!(out.kept.iter().all(|k| k.embedding.is_none()));
    }
}

//! Niche-aware retrieval over the knowledge repository.
//!
//! Vector search is used when the embedder is available and the category
//! has embedded documents. Otherwise, attribute filtering is the supported
//! mode: exact niche, then `general`, with exact subcategory first inside each.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    KnowledgeCategory, KnowledgeDocument, KnowledgeHit, NicheCatalog, NicheMatch, NicheSource, Store,
    GENERAL_NICHE,
};
use crate::domain::ports::{EmbeddingInput, EmbeddingProvider, KnowledgeRepository, KnowledgeVectorQuery};

/// Neighbours consulted when voting on a store's niche.
const NICHE_VOTE_NEIGHBOURS: usize = 10;

/// Result of importing documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub embedded: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    Wrapped { documents: Vec<KnowledgeDocument> },
    List(Vec<KnowledgeDocument>),
}

pub struct KnowledgeBase {
    repository: Arc<dyn KnowledgeRepository>,
    embedder: Arc<dyn EmbeddingProvider>,
    catalog: Arc<NicheCatalog>,
}

impl KnowledgeBase {
    pub fn new(
        repository: Arc<dyn KnowledgeRepository>,
        embedder: Arc<dyn EmbeddingProvider>,
        catalog: Arc<NicheCatalog>,
    ) -> Self {
        Self {
            repository,
            embedder,
            catalog,
        }
    }

    pub fn catalog(&self) -> &NicheCatalog {
        &self.catalog
    }

    /// Documents relevant to `query`, most relevant first.
    pub async fn search(
        &self,
        query: &str,
        category: KnowledgeCategory,
        niche: Option<&str>,
        subcategory: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<KnowledgeHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        if self.vectors_ready(category).await? {
            match self.embedder.embed_for_query(query).await {
                Ok(vector) if !vector.is_empty() => {
                    let filter = KnowledgeVectorQuery {
                        category: Some(category),
                        niches: niche
                            .map(|n| vec![n.to_string(), GENERAL_NICHE.to_string()])
                            .unwrap_or_default(),
                        exclude_general: false,
                        limit,
                    };
                    match self.repository.nearest(&filter, &vector).await {
                        Ok(hits) if !hits.is_empty() => return Ok(hits),
                        Ok(_) => {
                            tracing::debug!(
                                category = category.as_str(),
                                "Vector search empty, using attribute lookup"
                            );
                        }
                        Err(e) if e.aborts_pipeline() => return Err(e),
                        Err(e) => {
                            tracing::warn!(
                                category = category.as_str(),
                                error = %e,
                                "Vector search failed, using attribute lookup"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        category = category.as_str(),
                        error = %e,
                        "Query embedding failed, using attribute lookup"
                    );
                }
            }
        }

        self.repository
            .find_by_attributes(category, niche, subcategory, limit)
            .await
    }

    async fn vectors_ready(&self, category: KnowledgeCategory) -> DomainResult<bool> {
        if !self.embedder.is_available() {
            return Ok(false);
        }
        Ok(self.repository.count_embedded(category).await? > 0)
    }

    /// Classify a store into a niche, then refine the subcategory.
    ///
    /// A niche already set on the store wins. Otherwise nearest neighbours
    /// across non-general niches vote, closer neighbours weighing more. With
    /// no vectors, catalog keywords decide; with no match, `general`.
    /// Never fails; lookup errors fall through to the next method.
    pub async fn identify_niche(&self, store: &Store) -> NicheMatch {
        let context = niche_context(store);

        if let Some(niche) = store.niche.as_deref().filter(|n| self.catalog.contains(n)) {
            let subcategory = store
                .subcategory
                .clone()
                .filter(|s| {
                    self.catalog
                        .get(niche)
                        .is_some_and(|p| p.subcategories.contains_key(s))
                })
                .unwrap_or_else(|| self.catalog.refine_subcategory(niche, &context));
            return NicheMatch {
                niche: niche.to_string(),
                subcategory,
                source: NicheSource::Provided,
            };
        }

        let (niche, source) = match self.vote_niche(&context).await {
            Ok(Some(niche)) => (niche, NicheSource::VectorVote),
            Ok(None) => self.keyword_niche(&context),
            Err(e) => {
                tracing::warn!(store_id = %store.id, error = %e, "Niche vote failed, using keywords");
                self.keyword_niche(&context)
            }
        };

        let subcategory = self.catalog.refine_subcategory(&niche, &context);
        tracing::info!(
            store_id = %store.id,
            niche = %niche,
            subcategory = %subcategory,
            source = ?source,
            "Identified store niche"
        );
        NicheMatch {
            niche,
            subcategory,
            source,
        }
    }

    fn keyword_niche(&self, context: &str) -> (String, NicheSource) {
        match self.catalog.match_niche_by_keywords(context) {
            Some(niche) => (niche, NicheSource::KeywordMatch),
            None => (GENERAL_NICHE.to_string(), NicheSource::Default),
        }
    }

    async fn vote_niche(&self, context: &str) -> DomainResult<Option<String>> {
        if !self.embedder.is_available() || context.trim().is_empty() {
            return Ok(None);
        }
        let vector = self.embedder.embed_for_query(context).await?;
        if vector.is_empty() {
            return Ok(None);
        }

        let query = KnowledgeVectorQuery {
            category: None,
            niches: Vec::new(),
            exclude_general: true,
            limit: NICHE_VOTE_NEIGHBOURS,
        };
        let hits = self.repository.nearest(&query, &vector).await?;
        Ok(tally_votes(&hits, &self.catalog))
    }

    /// Embed and insert documents, in provider-sized batches.
    pub async fn import(&self, documents: Vec<KnowledgeDocument>) -> DomainResult<ImportReport> {
        let mut report = ImportReport {
            total: documents.len(),
            embedded: 0,
        };

        if !self.embedder.is_available() {
            for doc in &documents {
                self.repository.insert(doc, None).await?;
            }
            return Ok(report);
        }

        let batch_size = self.embedder.max_batch_size().max(1);
        for batch in documents.chunks(batch_size) {
            let inputs: Vec<EmbeddingInput> = batch
                .iter()
                .map(|doc| EmbeddingInput {
                    id: doc.id.to_string(),
                    text: doc.embedding_text(),
                })
                .collect();
            let outputs = self.embedder.embed_batch(&inputs).await?;
            let by_id: HashMap<String, Vec<f32>> =
                outputs.into_iter().map(|o| (o.id, o.vector)).collect();

            for doc in batch {
                let vector = by_id.get(&doc.id.to_string()).filter(|v| !v.is_empty());
                if vector.is_some() {
                    report.embedded += 1;
                }
                self.repository.insert(doc, vector.map(|v| v.as_slice())).await?;
            }
            tracing::debug!(batch = batch.len(), "Imported knowledge batch");
        }

        tracing::info!(total = report.total, embedded = report.embedded, "Knowledge import complete");
        Ok(report)
    }
}

/// Parse a YAML document file: a list, or a map with a `documents` list.
pub fn parse_documents_yaml(yaml: &str) -> DomainResult<Vec<KnowledgeDocument>> {
    let file: DocumentFile = serde_yaml::from_str(yaml)
        .map_err(|e| DomainError::SerializationError(format!("invalid knowledge file: {}", e)))?;
    let documents = match file {
        DocumentFile::Wrapped { documents } => documents,
        DocumentFile::List(documents) => documents,
    };
    if let Some(doc) = documents.iter().find(|d| d.title.trim().is_empty() || d.content.trim().is_empty()) {
        return Err(DomainError::ValidationFailed(format!(
            "knowledge document {} needs a title and content",
            doc.id
        )));
    }
    Ok(documents)
}

/// Name, categories and best sellers, joined for embedding and keyword scoring.
pub fn niche_context(store: &Store) -> String {
    let mut parts = vec![store.name.clone()];
    parts.extend(store.category_labels.iter().cloned());
    parts.extend(store.top_product_titles.iter().cloned());
    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Position-weighted vote: the i-th neighbour of n adds n - i.
fn tally_votes(hits: &[KnowledgeHit], catalog: &NicheCatalog) -> Option<String> {
    let n = hits.len();
    let mut scores: Vec<(String, usize)> = Vec::new();
    for (i, hit) in hits.iter().enumerate() {
        if hit.niche == GENERAL_NICHE || !catalog.contains(&hit.niche) {
            continue;
        }
        let weight = n - i;
        match scores.iter_mut().find(|(niche, _)| niche == &hit.niche) {
            Some((_, score)) => *score += weight,
            None => scores.push((hit.niche.clone(), weight)),
        }
    }
    // Ties go to the niche seen first, i.e. the closest one.
    scores
        .into_iter()
        .fold(None, |best: Option<(String, usize)>, (niche, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((niche, score)),
        })
        .map(|(niche, _)| niche)
}

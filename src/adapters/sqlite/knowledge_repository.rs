//! SQLite implementation of the KnowledgeRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::vector::{bytes_to_embedding, cosine_distance, embedding_to_bytes};
use crate::domain::models::{KnowledgeCategory, KnowledgeDocument, KnowledgeHit, GENERAL_NICHE};
use crate::domain::ports::{KnowledgeRepository, KnowledgeVectorQuery};

#[derive(Clone)]
pub struct SqliteKnowledgeRepository {
    pool: SqlitePool,
}

impl SqliteKnowledgeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KnowledgeRepository for SqliteKnowledgeRepository {
    async fn insert(&self, document: &KnowledgeDocument, embedding: Option<&[f32]>) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO knowledge_documents (id, title, content, category, niche, subcategory,
               metadata, embedding, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(document.id.to_string())
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.category.as_str())
        .bind(&document.niche)
        .bind(&document.subcategory)
        .bind(document.metadata.to_string())
        .bind(embedding.filter(|v| !v.is_empty()).map(embedding_to_bytes))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_embedded(&self, category: KnowledgeCategory) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM knowledge_documents WHERE category = ? AND embedding IS NOT NULL",
        )
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn nearest(&self, query: &KnowledgeVectorQuery, vector: &[f32]) -> DomainResult<Vec<KnowledgeHit>> {
        let rows: Vec<KnowledgeRow> = match query.category {
            Some(category) => {
                sqlx::query_as(
                    "SELECT * FROM knowledge_documents WHERE embedding IS NOT NULL AND category = ?",
                )
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM knowledge_documents WHERE embedding IS NOT NULL")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut scored = Vec::new();
        for row in rows {
            if query.exclude_general && row.niche == GENERAL_NICHE {
                continue;
            }
            if !query.niches.is_empty() && !query.niches.iter().any(|n| n == &row.niche) {
                continue;
            }
            let Some(blob) = row.embedding.as_deref() else { continue };
            let stored = bytes_to_embedding(blob)?;
            if stored.len() != vector.len() {
                tracing::debug!(
                    document_id = %row.id,
                    stored_dimension = stored.len(),
                    query_dimension = vector.len(),
                    "Skipping knowledge vector with different dimension"
                );
                continue;
            }
            let distance = cosine_distance(vector, &stored)?;
            scored.push((distance, row));
        }

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored
            .into_iter()
            .take(query.limit)
            .map(|(distance, row)| {
                let document: KnowledgeDocument = row.try_into()?;
                Ok(KnowledgeHit::from_document(document, 1.0 - distance))
            })
            .collect()
    }

    async fn find_by_attributes(
        &self,
        category: KnowledgeCategory,
        niche: Option<&str>,
        subcategory: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<KnowledgeHit>> {
        let rows: Vec<KnowledgeRow> = match niche {
            Some(niche) => {
                sqlx::query_as(
                    r#"SELECT * FROM knowledge_documents
                       WHERE category = ? AND (niche = ? OR niche = ?)
                       ORDER BY CASE WHEN niche = ? THEN 0 ELSE 1 END,
                                CASE WHEN subcategory = ? THEN 0 ELSE 1 END,
                                created_at ASC
                       LIMIT ?"#,
                )
                .bind(category.as_str())
                .bind(niche)
                .bind(GENERAL_NICHE)
                .bind(niche)
                .bind(subcategory)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"SELECT * FROM knowledge_documents
                       WHERE category = ?
                       ORDER BY CASE WHEN niche = ? THEN 0 ELSE 1 END,
                                CASE WHEN subcategory = ? THEN 0 ELSE 1 END,
                                created_at ASC
                       LIMIT ?"#,
                )
                .bind(category.as_str())
                .bind(GENERAL_NICHE)
                .bind(subcategory)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter()
            .map(|row| {
                let document: KnowledgeDocument = row.try_into()?;
                Ok(KnowledgeHit::from_document(document, 1.0))
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct KnowledgeRow {
    id: String,
    title: String,
    content: String,
    category: String,
    niche: String,
    subcategory: Option<String>,
    metadata: String,
    embedding: Option<Vec<u8>>,
}

impl TryFrom<KnowledgeRow> for KnowledgeDocument {
    type Error = DomainError;

    fn try_from(row: KnowledgeRow) -> Result<Self, Self::Error> {
        Ok(KnowledgeDocument {
            id: super::parse_uuid(&row.id)?,
            title: row.title,
            content: row.content,
            category: KnowledgeCategory::from_str(&row.category).ok_or_else(|| {
                DomainError::SerializationError(format!("unknown knowledge category: {}", row.category))
            })?,
            niche: row.niche,
            subcategory: row.subcategory,
            metadata: serde_json::from_str(&row.metadata)?,
        })
    }
}

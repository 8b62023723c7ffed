//! SQLite implementation of the AnalysisRepository and SuggestionVectorStore.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::vector::{bytes_to_embedding, cosine_distance, embedding_to_bytes};
use crate::domain::models::{
    AnalysisPeriod, AnalysisRecord, AnalysisResult, AnalysisStatus, ExpectedImpact,
    HealthClassification, HealthSummary, PipelineKind, PipelineStage, PreviousAnalysis,
    PreviousSuggestion, Suggestion, SuggestionCategory, SuggestionStatus,
};
use crate::domain::ports::{AnalysisRepository, NearestMatch, SuggestionVectorStore};

#[derive(Clone)]
pub struct SqliteAnalysisRepository {
    pool: SqlitePool,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored stage snapshot, if any.
    pub async fn stage_data(&self, id: Uuid, stage: PipelineStage) -> DomainResult<Option<serde_json::Value>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM analysis_stage_data WHERE analysis_id = ? AND stage = ?")
                .bind(id.to_string())
                .bind(stage.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_str(&data).map_err(DomainError::from))
            .transpose()
    }
}

#[async_trait]
impl AnalysisRepository for SqliteAnalysisRepository {
    async fn create(&self, record: &AnalysisRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO analyses (id, store_id, analysis_type, status, period_start, period_end,
               pipeline, niche, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.store_id.to_string())
        .bind(&record.analysis_type)
        .bind(record.status.as_str())
        .bind(record.period.start.to_rfc3339())
        .bind(record.period.end.to_rfc3339())
        .bind(record.pipeline.map(|p| p.as_str()))
        .bind(&record.niche)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<AnalysisRecord>> {
        let row: Option<AnalysisRow> = sqlx::query_as("SELECT * FROM analyses WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn mark_processing(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("UPDATE analyses SET status = ? WHERE id = ?")
            .bind(AnalysisStatus::Processing.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AnalysisNotFound(id));
        }
        Ok(())
    }

    async fn save_stage_data(
        &self,
        id: Uuid,
        stage: PipelineStage,
        data: &serde_json::Value,
    ) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO analysis_stage_data (analysis_id, stage, data, recorded_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(analysis_id, stage) DO UPDATE SET data = excluded.data,
               recorded_at = excluded.recorded_at"#,
        )
        .bind(id.to_string())
        .bind(stage.as_str())
        .bind(data.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete(
        &self,
        id: Uuid,
        result: &AnalysisResult,
        suggestions: &[Suggestion],
    ) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"UPDATE analyses SET status = ?, pipeline = ?, health_score = ?, classification = ?,
               main_points = ?, alerts = ?, opportunities = ?, metrics = ?, niche = ?,
               subcategory = ?, failed_stage = NULL, error_message = NULL, completed_at = ?
               WHERE id = ?"#,
        )
        .bind(AnalysisStatus::Completed.as_str())
        .bind(result.pipeline.as_str())
        .bind(result.health.score as i64)
        .bind(result.health.classification.as_str())
        .bind(serde_json::to_string(&result.health.main_points)?)
        .bind(serde_json::to_string(&result.alerts)?)
        .bind(serde_json::to_string(&result.opportunities)?)
        .bind(result.metrics.to_string())
        .bind(&result.niche)
        .bind(&result.subcategory)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::AnalysisNotFound(id));
        }

        for suggestion in suggestions {
            sqlx::query(
                r#"INSERT INTO suggestions (id, analysis_id, store_id, category, title, description,
                   recommended_action, expected_impact, target_metrics, specific_data,
                   justification, priority, status, embedding, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(suggestion.id.to_string())
            .bind(id.to_string())
            .bind(suggestion.store_id.to_string())
            .bind(suggestion.category.as_str())
            .bind(&suggestion.title)
            .bind(&suggestion.description)
            .bind(&suggestion.recommended_action)
            .bind(suggestion.expected_impact.as_str())
            .bind(serde_json::to_string(&suggestion.target_metrics)?)
            .bind(suggestion.specific_data.to_string())
            .bind(&suggestion.justification)
            .bind(suggestion.priority as i64)
            .bind(suggestion.status.as_str())
            .bind(suggestion.embedding.as_deref().map(embedding_to_bytes))
            .bind(suggestion.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, stage: PipelineStage, message: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE analyses SET status = ?, failed_stage = ?, error_message = ?, completed_at = ? WHERE id = ?",
        )
        .bind(AnalysisStatus::Failed.as_str())
        .bind(stage.as_str())
        .bind(message)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AnalysisNotFound(id));
        }
        Ok(())
    }

    async fn recent_suggestions(
        &self,
        store_id: Uuid,
        limit: usize,
    ) -> DomainResult<Vec<PreviousSuggestion>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"SELECT title, category, status, created_at FROM suggestions
               WHERE store_id = ? ORDER BY created_at DESC LIMIT ?"#,
        )
        .bind(store_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(title, category, status, created_at)| {
                Ok(PreviousSuggestion {
                    title,
                    category,
                    status: SuggestionStatus::from_str(&status).unwrap_or_default(),
                    created_at: super::parse_datetime(&created_at)?,
                })
            })
            .collect()
    }

    async fn recent_analyses(
        &self,
        store_id: Uuid,
        exclude: Uuid,
        limit: usize,
    ) -> DomainResult<Vec<PreviousAnalysis>> {
        let rows: Vec<(String, Option<i64>, Option<String>, String)> = sqlx::query_as(
            r#"SELECT id, health_score, classification, created_at FROM analyses
               WHERE store_id = ? AND id != ? AND status = 'completed'
               ORDER BY created_at DESC LIMIT ?"#,
        )
        .bind(store_id.to_string())
        .bind(exclude.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, score, classification, created_at)| {
                Ok(PreviousAnalysis {
                    id: super::parse_uuid(&id)?,
                    health_score: score.map(|s| s.clamp(0, 100) as u8),
                    classification,
                    created_at: super::parse_datetime(&created_at)?,
                })
            })
            .collect()
    }

    async fn suggestions_for(&self, analysis_id: Uuid) -> DomainResult<Vec<Suggestion>> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(
            "SELECT * FROM suggestions WHERE analysis_id = ? ORDER BY priority ASC, created_at ASC",
        )
        .bind(analysis_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[async_trait]
impl SuggestionVectorStore for SqliteAnalysisRepository {
    async fn nearest(&self, scope_id: &str, vector: &[f32]) -> DomainResult<Option<NearestMatch>> {
        let rows: Vec<(String, Vec<u8>)> = sqlx::query_as(
            "SELECT id, embedding FROM suggestions WHERE store_id = ? AND embedding IS NOT NULL",
        )
        .bind(scope_id)
        .fetch_all(&self.pool)
        .await?;

        let mut best: Option<NearestMatch> = None;
        for (id, blob) in rows {
            let stored = bytes_to_embedding(&blob)?;
            let distance = cosine_distance(vector, &stored)?;
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(NearestMatch { id, distance });
            }
        }
        Ok(best)
    }
}

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: String,
    store_id: String,
    analysis_type: String,
    status: String,
    period_start: String,
    period_end: String,
    pipeline: Option<String>,
    health_score: Option<i64>,
    classification: Option<String>,
    main_points: Option<String>,
    niche: Option<String>,
    failed_stage: Option<String>,
    error_message: Option<String>,
    created_at: String,
    completed_at: Option<String>,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = DomainError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let health = match row.health_score {
            Some(score) => {
                let score = score.clamp(0, 100) as u8;
                Some(HealthSummary {
                    score,
                    classification: row
                        .classification
                        .as_deref()
                        .and_then(HealthClassification::parse)
                        .unwrap_or_else(|| HealthClassification::from_score(score)),
                    main_points: super::parse_json_or_default(row.main_points)?,
                })
            }
            None => None,
        };

        let pipeline = match row.pipeline.as_deref() {
            Some("full") => Some(PipelineKind::Full),
            Some("lite") => Some(PipelineKind::Lite),
            _ => None,
        };

        Ok(AnalysisRecord {
            id: super::parse_uuid(&row.id)?,
            store_id: super::parse_uuid(&row.store_id)?,
            analysis_type: row.analysis_type,
            status: AnalysisStatus::from_str(&row.status).ok_or_else(|| {
                DomainError::SerializationError(format!("unknown analysis status: {}", row.status))
            })?,
            period: AnalysisPeriod::new(
                super::parse_datetime(&row.period_start)?,
                super::parse_datetime(&row.period_end)?,
            ),
            pipeline,
            health,
            niche: row.niche,
            failed_stage: row.failed_stage,
            error_message: row.error_message,
            created_at: super::parse_datetime(&row.created_at)?,
            completed_at: super::parse_optional_datetime(row.completed_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SuggestionRow {
    id: String,
    analysis_id: String,
    store_id: String,
    category: String,
    title: String,
    description: String,
    recommended_action: String,
    expected_impact: String,
    target_metrics: String,
    specific_data: String,
    justification: String,
    priority: i64,
    status: String,
    embedding: Option<Vec<u8>>,
    created_at: String,
}

impl TryFrom<SuggestionRow> for Suggestion {
    type Error = DomainError;

    fn try_from(row: SuggestionRow) -> Result<Self, Self::Error> {
        Ok(Suggestion {
            id: super::parse_uuid(&row.id)?,
            analysis_id: super::parse_uuid(&row.analysis_id)?,
            store_id: super::parse_uuid(&row.store_id)?,
            category: SuggestionCategory::parse(&row.category).unwrap_or(SuggestionCategory::Other),
            title: row.title,
            description: row.description,
            recommended_action: row.recommended_action,
            expected_impact: ExpectedImpact::parse(&row.expected_impact),
            target_metrics: serde_json::from_str(&row.target_metrics)?,
            specific_data: serde_json::from_str(&row.specific_data)?,
            justification: row.justification,
            priority: row.priority.max(0) as u32,
            status: SuggestionStatus::from_str(&row.status).unwrap_or_default(),
            embedding: row.embedding.as_deref().map(bytes_to_embedding).transpose()?,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{Alert, SuggestionDraft};
    use chrono::Duration;

    async fn setup() -> (SqliteAnalysisRepository, AnalysisRecord) {
        let pool = create_migrated_test_pool().await.unwrap();
        let repo = SqliteAnalysisRepository::new(pool);
        let record = AnalysisRecord::new(
            Uuid::new_v4(),
            "general",
            AnalysisPeriod::last_days(30, Utc::now()),
        );
        repo.create(&record).await.unwrap();
        (repo, record)
    }

    fn draft(title: &str, priority: u32) -> SuggestionDraft {
        SuggestionDraft {
            category: SuggestionCategory::Marketing,
            title: title.to_string(),
            description: "desc".to_string(),
            recommended_action: "act".to_string(),
            expected_impact: ExpectedImpact::High,
            target_metrics: vec!["conversion_rate".to_string()],
            supporting_data: serde_json::json!({"visits": 10}),
            justification: "why".to_string(),
            priority,
            quality_score: None,
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            pipeline: PipelineKind::Full,
            health: HealthSummary {
                score: 72,
                classification: HealthClassification::Good,
                main_points: vec!["steady".to_string()],
            },
            alerts: vec![Alert {
                kind: "stock".to_string(),
                severity: "high".to_string(),
                message: "low stock".to_string(),
            }],
            opportunities: vec![],
            metrics: serde_json::json!({"overall_health": {"score": 72}}),
            niche: "fashion".to_string(),
            subcategory: "general".to_string(),
        }
    }

    #[tokio::test]
    async fn test_complete_writes_summary_and_suggestions() {
        let (repo, record) = setup().await;
        let suggestions: Vec<Suggestion> = [draft("b", 2), draft("a", 1)]
            .into_iter()
            .map(|d| Suggestion::from_draft(d, record.id, record.store_id, Some(vec![1.0, 0.0])).unwrap())
            .collect();

        repo.mark_processing(record.id).await.unwrap();
        repo.complete(record.id, &result(), &suggestions).await.unwrap();

        let stored = repo.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Completed);
        assert_eq!(stored.health.unwrap().score, 72);
        assert_eq!(stored.niche.as_deref(), Some("fashion"));

        let persisted = repo.suggestions_for(record.id).await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].title, "a");
        assert_eq!(persisted[0].embedding.as_deref(), Some(&[1.0, 0.0][..]));
    }

    #[tokio::test]
    async fn test_complete_for_missing_analysis_writes_nothing() {
        let (repo, record) = setup().await;
        let missing = Uuid::new_v4();
        let suggestion = Suggestion::from_draft(draft("x", 1), missing, record.store_id, None).unwrap();

        let err = repo.complete(missing, &result(), &[suggestion]).await.unwrap_err();

        assert!(matches!(err, DomainError::AnalysisNotFound(_)));
        assert!(repo.recent_suggestions(record.store_id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_failed_records_stage() {
        let (repo, record) = setup().await;
        repo.mark_failed(record.id, PipelineStage::Analyst, "provider down").await.unwrap();

        let stored = repo.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Failed);
        assert_eq!(stored.failed_stage.as_deref(), Some("analyst"));
        assert_eq!(stored.error_message.as_deref(), Some("provider down"));
    }

    #[tokio::test]
    async fn test_stage_data_is_upserted() {
        let (repo, record) = setup().await;
        repo.save_stage_data(record.id, PipelineStage::Collector, &serde_json::json!({"v": 1}))
            .await
            .unwrap();
        repo.save_stage_data(record.id, PipelineStage::Collector, &serde_json::json!({"v": 2}))
            .await
            .unwrap();

        let data = repo.stage_data(record.id, PipelineStage::Collector).await.unwrap();
        assert_eq!(data, Some(serde_json::json!({"v": 2})));
    }

    #[tokio::test]
    async fn test_nearest_is_scoped_to_store() {
        let (repo, record) = setup().await;
        let ours = Suggestion::from_draft(draft("ours", 1), record.id, record.store_id, Some(vec![1.0, 0.0]))
            .unwrap();
        repo.complete(record.id, &result(), &[ours]).await.unwrap();

        let other_store = AnalysisRecord::new(Uuid::new_v4(), "general", record.period);
        repo.create(&other_store).await.unwrap();
        let theirs = Suggestion::from_draft(
            draft("theirs", 1),
            other_store.id,
            other_store.store_id,
            Some(vec![0.0, 1.0]),
        )
        .unwrap();
        repo.complete(other_store.id, &result(), &[theirs]).await.unwrap();

        let hit = repo
            .nearest(&record.store_id.to_string(), &[0.0, 1.0])
            .await
            .unwrap()
            .unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-6);

        let none = repo.nearest(&Uuid::new_v4().to_string(), &[0.0, 1.0]).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_recent_analyses_excludes_current_and_pending() {
        let (repo, record) = setup().await;
        let mut earlier = AnalysisRecord::new(record.store_id, "general", record.period);
        earlier.created_at = Utc::now() - Duration::days(7);
        repo.create(&earlier).await.unwrap();
        repo.complete(earlier.id, &result(), &[]).await.unwrap();

        let previous = repo.recent_analyses(record.store_id, record.id, 5).await.unwrap();
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].id, earlier.id);
        assert_eq!(previous[0].health_score, Some(72));
    }
}

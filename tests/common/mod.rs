//! Common test utilities for integration tests
//!
//! Deterministic collaborators for running both pipelines end to end against
//! an in-memory SQLite database.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use storelens::adapters::providers::{ScriptedProvider, ScriptedResponse};
use storelens::adapters::sqlite::{create_migrated_test_pool, SqliteAnalysisRepository, SqliteKnowledgeRepository};
use storelens::domain::errors::{DomainError, DomainResult};
use storelens::domain::models::metrics::{OrderStats, ProductStats, TopProduct};
use storelens::domain::models::{
    AnalysisPeriod, AnalysisRecord, ChatMessage, ChatOptions, NicheCatalog, PipelineConfig, Store,
    StoreMetrics,
};
use storelens::domain::ports::{
    AiProvider, AnalysisRepository, EmbeddingInput, EmbeddingOutput, EmbeddingProvider,
    StoreMetricsProvider,
};
use storelens::services::{DefaultPromptTemplates, KnowledgeBase, PipelineServices};

pub const DIMENSION: usize = 64;

/// Bag-of-words hashing embedder. Identical texts map to identical unit
/// vectors; texts sharing no words are orthogonal in expectation.
pub struct HashingEmbedder;

impl HashingEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMENSION];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Ok(inputs
            .iter()
            .map(|i| EmbeddingOutput {
                id: i.id.clone(),
                vector: Self::vector(&i.text),
            })
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        32
    }
}

/// Claims vectors but fails every call.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
        Err(DomainError::EmbeddingFailed("service unavailable".to_string()))
    }

    async fn embed_batch(&self, _inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Err(DomainError::EmbeddingFailed("service unavailable".to_string()))
    }

    fn max_batch_size(&self) -> usize {
        1
    }
}

/// Answers every call with an empty object, after a fixed delay.
pub struct SlowProvider {
    pub delay: Duration,
}

#[async_trait]
impl AiProvider for SlowProvider {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn chat(&self, _messages: &[ChatMessage], _options: &ChatOptions) -> DomainResult<String> {
        tokio::time::sleep(self.delay).await;
        Ok("{}".to_string())
    }
}

/// Serves the same metrics for every store and period.
pub struct FixedMetrics(pub StoreMetrics);

#[async_trait]
impl StoreMetricsProvider for FixedMetrics {
    async fn collect(&self, _store: &Store, _period: &AnalysisPeriod) -> DomainResult<StoreMetrics> {
        Ok(self.0.clone())
    }
}

pub fn fashion_store() -> Store {
    let mut store = Store::new("Ateliê Aurora");
    store.category_labels = vec!["Vestidos".to_string(), "Saias".to_string(), "Blusas".to_string()];
    store.top_product_titles = vec![
        "Vestido midi floral".to_string(),
        "Saia plissada".to_string(),
    ];
    store
}

pub fn fashion_metrics() -> StoreMetrics {
    StoreMetrics {
        orders: OrderStats {
            total: 240,
            completed: 220,
            cancelled: 20,
            revenue: 43_200.0,
            average_ticket: 180.0,
            previous_period_revenue: Some(39_000.0),
        },
        products: ProductStats {
            total: 120,
            active: 110,
            out_of_stock: 14,
            low_stock: 9,
            without_sales: 30,
            top_sellers: vec![TopProduct {
                title: "Vestido midi floral".to_string(),
                units_sold: 48,
                revenue: 9_120.0,
            }],
        },
        ..StoreMetrics::default()
    }
}

pub fn suggestion_json(title: &str, category: &str, impact: &str, priority: u32) -> Value {
    json!({
        "category": category,
        "title": title,
        "description": format!("{} para a coleção atual", title),
        "recommended_action": format!("Executar: {}", title),
        "expected_impact": impact,
        "target_metrics": ["revenue"],
        "justification": "Baseado nas métricas do período",
        "priority": priority
    })
}

pub fn collector_response() -> ScriptedResponse {
    ScriptedResponse::json(json!({
        "summary": "Receita cresceu 11% com ruptura em best sellers",
        "key_facts": ["14 produtos sem estoque", "ticket médio 180"],
        "historical_insights": [],
        "data_gaps": []
    }))
}

pub fn analyst_response() -> ScriptedResponse {
    ScriptedResponse::text(format!(
        "Segue a análise:\n```json\n{}\n```",
        json!({
            "overall_health": {
                "score": 72,
                "classification": "good",
                "main_points": ["Receita em alta", "Ruptura de estoque"]
            },
            "alerts": [{"kind": "stock", "severity": "high", "message": "Best sellers sem estoque"}],
            "opportunities": [{"title": "Kits de looks", "description": "Combinar peças", "potential_impact": "high"}]
        })
    ))
}

pub fn strategist_response(titles: &[(&str, &str, &str)]) -> ScriptedResponse {
    let suggestions: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, (title, category, impact))| suggestion_json(title, category, impact, i as u32 + 1))
        .collect();
    ScriptedResponse::json(json!({ "suggestions": suggestions }))
}

pub fn critic_approving(titles: &[&str]) -> ScriptedResponse {
    let approved: Vec<Value> = titles
        .iter()
        .map(|t| json!({ "original_title": t, "quality_score": 8.5 }))
        .collect();
    ScriptedResponse::json(json!({
        "approved_suggestions": approved,
        "removed_suggestions": [],
        "observations": "Sugestões específicas e viáveis"
    }))
}

pub const DEFAULT_SUGGESTIONS: &[(&str, &str, &str)] = &[
    ("Repor best sellers esgotados", "estoque", "alto"),
    ("Criar kits de looks", "produtos", "médio"),
    ("Campanha de recompra por email", "marketing", "baixo"),
];

/// Provider answering every agent of both pipelines with well-formed output.
pub fn happy_provider() -> ScriptedProvider {
    let titles: Vec<&str> = DEFAULT_SUGGESTIONS.iter().map(|(t, _, _)| *t).collect();
    ScriptedProvider::new()
        .with_rule("[agent:collector]", collector_response())
        .with_rule("[agent:profile_synthesizer]", ScriptedResponse::json(json!({
            "positioning": "moda feminina de ticket médio",
            "target_audience": "mulheres 25-40",
            "price_tier": "mid",
            "strengths": ["estampas exclusivas"]
        })))
        .with_rule("[agent:analyst]", analyst_response())
        .with_rule("[agent:lite_analyst]", analyst_response())
        .with_rule("[agent:strategist]", strategist_response(DEFAULT_SUGGESTIONS))
        .with_rule("[agent:lite_strategist]", strategist_response(DEFAULT_SUGGESTIONS))
        .with_rule("[agent:critic]", critic_approving(&titles))
}

/// Everything a test needs to run and inspect a pipeline.
pub struct Harness {
    pub repository: Arc<SqliteAnalysisRepository>,
    pub services: PipelineServices,
}

impl Harness {
    pub async fn new(provider: Arc<ScriptedProvider>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(provider, embedder, PipelineConfig::default()).await
    }

    pub async fn with_config(
        provider: Arc<dyn AiProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: PipelineConfig,
    ) -> Self {
        let pool = create_migrated_test_pool().await.unwrap();
        let repository = Arc::new(SqliteAnalysisRepository::new(pool.clone()));
        let knowledge = Arc::new(KnowledgeBase::new(
            Arc::new(SqliteKnowledgeRepository::new(pool)),
            embedder.clone(),
            Arc::new(NicheCatalog::builtin().unwrap()),
        ));

        let services = PipelineServices {
            provider,
            prompts: Arc::new(DefaultPromptTemplates::new()),
            embedder,
            repository: repository.clone(),
            vector_store: repository.clone(),
            knowledge,
            metrics: Arc::new(FixedMetrics(fashion_metrics())),
            config,
        };

        Self { repository, services }
    }

    pub async fn record(&self, store: &Store) -> AnalysisRecord {
        let record = AnalysisRecord::new(
            store.id,
            "general",
            AnalysisPeriod::last_days(90, chrono::Utc::now()),
        );
        self.repository.create(&record).await.unwrap();
        record
    }
}

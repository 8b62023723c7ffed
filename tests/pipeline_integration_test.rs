//! End-to-end pipeline runs against in-memory SQLite and a scripted provider.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    analyst_response, critic_approving, fashion_store, happy_provider, strategist_response, FailingEmbedder,
    Harness, HashingEmbedder, SlowProvider, DEFAULT_SUGGESTIONS,
};
use storelens::adapters::providers::{ScriptedProvider, ScriptedResponse};
use storelens::domain::errors::DomainError;
use storelens::domain::models::{
    AnalysisStatus, ExpectedImpact, HealthClassification, PipelineConfig, PipelineKind, PipelineStage,
    DEFAULT_HEALTH_SCORE,
};
use storelens::domain::ports::AnalysisRepository;
use storelens::services::{FullPipeline, LitePipeline};

#[tokio::test]
async fn test_full_pipeline_happy_path() {
    let provider = Arc::new(happy_provider());
    let harness = Harness::new(provider.clone(), Arc::new(HashingEmbedder)).await;
    let store = fashion_store();
    let record = harness.record(&store).await;

    let outcome = FullPipeline::new(harness.services.clone())
        .run_full(&store, &record)
        .await
        .expect("pipeline should complete");

    assert_eq!(outcome.pipeline, PipelineKind::Full);
    assert_eq!(outcome.niche, "fashion");
    assert_eq!(outcome.overall_health.score, 72);
    assert_eq!(outcome.overall_health.classification, HealthClassification::Good);
    assert_eq!(outcome.suggestions_count, DEFAULT_SUGGESTIONS.len());

    let suggestions = harness.repository.suggestions_for(record.id).await.unwrap();
    assert!(suggestions.len() <= 9);
    let impacts: Vec<ExpectedImpact> = suggestions.iter().map(|s| s.expected_impact).collect();
    assert_eq!(
        impacts,
        vec![ExpectedImpact::High, ExpectedImpact::Medium, ExpectedImpact::Low]
    );
    assert!(suggestions.iter().all(|s| s.store_id == store.id));

    let stored = harness.repository.get(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AnalysisStatus::Completed);
    assert_eq!(stored.pipeline, Some(PipelineKind::Full));
    assert_eq!(stored.niche.as_deref(), Some("fashion"));
    assert!(stored.completed_at.is_some());

    for stage in [
        PipelineStage::NicheIdentification,
        PipelineStage::Collector,
        PipelineStage::Critic,
        PipelineStage::SimilarityFilter,
    ] {
        assert!(
            harness.repository.stage_data(record.id, stage).await.unwrap().is_some(),
            "missing checkpoint for {}",
            stage.as_str()
        );
    }

    let prompts: Vec<String> = provider.calls().await.iter().map(|c| c.prompt()).collect();
    assert_eq!(prompts.iter().filter(|p| p.contains("[agent:critic]")).count(), 1);
    assert!(prompts.iter().all(|p| !p.contains("[agent:lite_")));
}

#[tokio::test]
async fn test_unparseable_analyst_output_degrades_to_defaults() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_rule("[agent:collector]", common::collector_response())
            .with_rule("[agent:profile_synthesizer]", ScriptedResponse::text("{}"))
            .with_rule("[agent:analyst]", ScriptedResponse::text("Desculpe, não consegui analisar."))
            .with_rule("[agent:strategist]", strategist_response(DEFAULT_SUGGESTIONS))
            .with_rule("[agent:critic]", critic_approving(&["Repor best sellers esgotados"])),
    );
    let harness = Harness::new(provider, Arc::new(HashingEmbedder)).await;
    let store = fashion_store();
    let record = harness.record(&store).await;

    let outcome = FullPipeline::new(harness.services.clone())
        .run_full(&store, &record)
        .await
        .unwrap();

    assert_eq!(outcome.overall_health.score, DEFAULT_HEALTH_SCORE);
    assert_eq!(outcome.overall_health.classification, HealthClassification::Attention);
    assert_eq!(outcome.metrics["overall_health"]["classification"], "attention");
    assert!(outcome.metrics["alerts"].as_array().is_some_and(|a| a.is_empty()));

    // Critic approved one title; the rest were removed.
    assert_eq!(outcome.suggestions_count, 1);
}

#[tokio::test]
async fn test_unparseable_critic_output_keeps_strategist_suggestions() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_rule("[agent:collector]", common::collector_response())
            .with_rule("[agent:profile_synthesizer]", ScriptedResponse::text("{}"))
            .with_rule("[agent:analyst]", analyst_response())
            .with_rule("[agent:strategist]", strategist_response(DEFAULT_SUGGESTIONS))
            .with_rule("[agent:critic]", ScriptedResponse::text("tudo certo")),
    );
    let harness = Harness::new(provider, Arc::new(HashingEmbedder)).await;
    let store = fashion_store();
    let record = harness.record(&store).await;

    let outcome = FullPipeline::new(harness.services.clone())
        .run_full(&store, &record)
        .await
        .unwrap();
    assert_eq!(outcome.suggestions_count, DEFAULT_SUGGESTIONS.len());

    let critic = harness
        .repository
        .stage_data(record.id, PipelineStage::Critic)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(critic["observations"]["critic_available"], false);
}

#[tokio::test]
async fn test_lite_pipeline_persists_same_columns_as_full() {
    let provider = Arc::new(happy_provider());
    let harness = Harness::new(provider.clone(), Arc::new(HashingEmbedder)).await;

    let full_store = fashion_store();
    let full_record = harness.record(&full_store).await;
    FullPipeline::new(harness.services.clone())
        .run_full(&full_store, &full_record)
        .await
        .unwrap();
    let calls_after_full = provider.call_count().await;

    let lite_store = fashion_store();
    let lite_record = harness.record(&lite_store).await;
    let outcome = LitePipeline::new(harness.services.clone())
        .run_lite(&lite_store, &lite_record)
        .await
        .unwrap();

    assert_eq!(outcome.pipeline, PipelineKind::Lite);
    assert_eq!(provider.call_count().await - calls_after_full, 2);

    let full = harness.repository.suggestions_for(full_record.id).await.unwrap();
    let lite = harness.repository.suggestions_for(lite_record.id).await.unwrap();
    assert!(!lite.is_empty() && lite.len() <= 5);

    let shape = |s: &storelens::Suggestion| {
        let mut keys: Vec<String> = serde_json::to_value(s)
            .unwrap()
            .as_object()
            .unwrap()
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    };
    assert_eq!(shape(&full[0]), shape(&lite[0]));
    assert_eq!(full[0].title, lite[0].title);
    assert_eq!(full[0].category, lite[0].category);

    let stored = harness.repository.get(lite_record.id).await.unwrap().unwrap();
    assert_eq!(stored.pipeline, Some(PipelineKind::Lite));
}

#[tokio::test]
async fn test_provider_failure_marks_failed_stage() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_rule("[agent:collector]", common::collector_response())
            .with_rule("[agent:profile_synthesizer]", ScriptedResponse::text("{}"))
            .with_rule("[agent:analyst]", analyst_response())
            .with_rule("[agent:strategist]", ScriptedResponse::failure("quota exceeded")),
    );
    let harness = Harness::new(provider.clone(), Arc::new(HashingEmbedder)).await;
    let store = fashion_store();
    let record = harness.record(&store).await;

    let err = FullPipeline::new(harness.services.clone())
        .run_full(&store, &record)
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Strategist);
    assert!(matches!(err.source, DomainError::ProviderFailed { .. }));

    let stored = harness.repository.get(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AnalysisStatus::Failed);
    assert_eq!(stored.failed_stage.as_deref(), Some("strategist"));
    assert!(stored.error_message.unwrap().contains("quota exceeded"));
    assert!(harness.repository.suggestions_for(record.id).await.unwrap().is_empty());

    let prompts: Vec<String> = provider.calls().await.iter().map(|c| c.prompt()).collect();
    assert!(prompts.iter().all(|p| !p.contains("[agent:critic]")));
}

#[tokio::test]
async fn test_unconfigured_provider_fails_first_agent_stage() {
    let provider = Arc::new(ScriptedProvider::new().unconfigured());
    let harness = Harness::new(provider, Arc::new(HashingEmbedder)).await;
    let store = fashion_store();
    let record = harness.record(&store).await;

    let err = LitePipeline::new(harness.services.clone())
        .run_lite(&store, &record)
        .await
        .unwrap_err();

    assert_eq!(err.stage, PipelineStage::Analyst);
    assert!(matches!(err.source, DomainError::ProviderNotConfigured(_)));
}

#[tokio::test]
async fn test_similarity_filter_drops_repeated_suggestions() {
    let provider = Arc::new(happy_provider());
    let harness = Harness::new(provider, Arc::new(HashingEmbedder)).await;
    let store = fashion_store();

    let first = harness.record(&store).await;
    let pipeline = FullPipeline::new(harness.services.clone());
    let outcome = pipeline.run_full(&store, &first).await.unwrap();
    assert_eq!(outcome.suggestions_count, DEFAULT_SUGGESTIONS.len());

    let second = harness.record(&store).await;
    let outcome = pipeline.run_full(&store, &second).await.unwrap();
    assert_eq!(outcome.suggestions_count, 0);

    let similarity = harness
        .repository
        .stage_data(second.id, PipelineStage::SimilarityFilter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        similarity["duplicates"].as_array().map(Vec::len),
        Some(DEFAULT_SUGGESTIONS.len())
    );

    // Another store never sees the first store's vectors.
    let other = fashion_store();
    let third = harness.record(&other).await;
    let outcome = pipeline.run_full(&other, &third).await.unwrap();
    assert_eq!(outcome.suggestions_count, DEFAULT_SUGGESTIONS.len());
}

#[tokio::test]
async fn test_similarity_filter_fails_open() {
    let provider = Arc::new(happy_provider());
    let harness = Harness::new(provider, Arc::new(FailingEmbedder)).await;
    let store = fashion_store();

    for _ in 0..2 {
        let record = harness.record(&store).await;
        let outcome = FullPipeline::new(harness.services.clone())
            .run_full(&store, &record)
            .await
            .unwrap();
        assert_eq!(outcome.suggestions_count, DEFAULT_SUGGESTIONS.len());
        assert_eq!(outcome.niche, "fashion");
    }
}

#[tokio::test]
async fn test_slow_stage_times_out_and_marks_analysis_failed() {
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_secs(3),
    });
    let config = PipelineConfig {
        stage_timeout_secs: 1,
        ..PipelineConfig::default()
    };
    let harness = Harness::with_config(provider, Arc::new(HashingEmbedder), config).await;
    let store = fashion_store();
    let record = harness.record(&store).await;

    let started = std::time::Instant::now();
    let err = FullPipeline::new(harness.services.clone())
        .run_full(&store, &record)
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(err.source, DomainError::StageTimeout { seconds: 1 }));
    assert_eq!(err.stage, PipelineStage::Collector);

    let stored = harness.repository.get(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AnalysisStatus::Failed);
    assert_eq!(stored.failed_stage.as_deref(), Some("collector"));
    assert!(harness.repository.suggestions_for(record.id).await.unwrap().is_empty());
}

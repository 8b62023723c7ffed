//! The nine-stage analysis pipeline.

use tracing::instrument;

use super::{merge_history, persist, PersistSummary, PipelineServices};
use crate::domain::errors::{DomainResult, PipelineError};
use crate::domain::models::{
    AnalysisOutcome, AnalysisRecord, AnalysisRequest, AnalysisResult, AnalystOutput, BenchmarkContext,
    CollectorOutput, HistoricalContext, KnowledgeCategory, NicheMatch, PipelineContext, PipelineKind,
    PipelineStage, Store, StoreMetrics,
};
use crate::services::agents::{
    AgentRuntime, AnalystAgent, AnalystInput, BenchmarkPosition, CollectorAgent, CollectorInput,
    CriticAgent, CriticInput, ProfileInput, ProfileSynthesizerAgent, StrategistAgent, StrategistInput,
};
use crate::services::analysis_router::AnalysisRouter;
use crate::services::similarity_service::SimilarityService;

/// Gap recorded when store metrics could not be collected.
pub const METRICS_UNAVAILABLE_GAP: &str = "store_metrics_unavailable";

pub struct FullPipeline {
    services: PipelineServices,
}

impl FullPipeline {
    pub fn new(services: PipelineServices) -> Self {
        Self { services }
    }

    /// Run the pipeline for a stored analysis record.
    pub async fn run_full(&self, store: &Store, record: &AnalysisRecord) -> Result<AnalysisOutcome, PipelineError> {
        self.run(AnalysisRequest::new(store, record)).await
    }

    #[instrument(
        name = "full_pipeline",
        skip(self, request),
        fields(analysis_id = %request.analysis_id, store_id = %request.store.id)
    )]
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, PipelineError> {
        let s = &self.services;
        let runner = s.stage_runner(request.analysis_id);
        let module = AnalysisRouter::resolve(&request.analysis_type);
        let runtime = s.runtime();
        let mut ctx = PipelineContext::new();

        runner.start(PipelineStage::NicheIdentification).await?;
        tracing::info!(
            analysis_type = module.analysis_type.as_str(),
            specialized = module.is_specialized,
            provider = runtime.provider_name(),
            "Starting full pipeline"
        );

        let niche = runner
            .run(PipelineStage::NicheIdentification, async {
                Ok(s.knowledge.identify_niche(&request.store).await)
            })
            .await?;
        runner
            .check(PipelineStage::NicheIdentification, ctx.record_niche(niche.clone()))
            .await?;

        let history = runner
            .run(PipelineStage::HistoricalContextLoad, self.load_history(&request))
            .await?;
        runner
            .check(PipelineStage::HistoricalContextLoad, ctx.record_history(history.clone()))
            .await?;

        let benchmarks = runner
            .run(PipelineStage::BenchmarkRetrieval, self.retrieve_benchmarks(&niche))
            .await?;
        runner
            .check(PipelineStage::BenchmarkRetrieval, ctx.record_benchmarks(benchmarks.clone()))
            .await?;

        let collector = runner
            .run(
                PipelineStage::Collector,
                self.collect(&runtime, &request, &niche, &history, &benchmarks, &module.collector_focus),
            )
            .await?;
        runner
            .check(PipelineStage::Collector, ctx.record_collector(collector.clone()))
            .await?;

        let analyst = runner
            .run(PipelineStage::Analyst, async {
                let input = AnalystInput {
                    store_name: &request.store.name,
                    period: &request.period,
                    niche: &niche,
                    metrics: &collector.metrics,
                    collector_summary: Some(collector.summary.as_str()).filter(|s| !s.is_empty()),
                    key_facts: &collector.key_facts,
                    benchmarks: benchmarks.benchmarks.as_ref(),
                    benchmark_position: BenchmarkPosition::compute(
                        &collector.metrics,
                        benchmarks.benchmarks.as_ref(),
                    ),
                    documents: &benchmarks.documents,
                    previous_analyses: &history.previous_analyses,
                    keywords: &module.analyst_keywords,
                };
                AnalystAgent::new(runtime.clone()).run(&input).await
            })
            .await?;
        runner
            .check(PipelineStage::Analyst, ctx.record_analyst(analyst.clone()))
            .await?;

        let strategist = runner
            .run(PipelineStage::Strategist, async {
                let strategies = s
                    .search_knowledge(&strategy_query(&analyst), KnowledgeCategory::Strategy, &niche)
                    .await?;
                let input = StrategistInput {
                    store_name: &request.store.name,
                    niche: &niche,
                    health: &analyst.health,
                    alerts: &analyst.alerts,
                    opportunities: &analyst.opportunities,
                    analysis: &analyst.metrics,
                    collector_summary: Some(collector.summary.as_str()).filter(|s| !s.is_empty()),
                    profile: collector.profile.as_ref(),
                    strategies: &strategies,
                    previous_suggestions: &history.previous_suggestions,
                    exemplars: &module.strategist_exemplars,
                    max_suggestions: s.config.max_suggestions,
                };
                StrategistAgent::new(runtime.clone())
                    .run(&input, module.temperature_override)
                    .await
            })
            .await?;
        runner
            .check(PipelineStage::Strategist, ctx.record_strategist(strategist.clone()))
            .await?;

        let critic = runner
            .run(PipelineStage::Critic, async {
                let input = CriticInput {
                    store_name: &request.store.name,
                    niche: &niche,
                    health: &analyst.health,
                    suggestions: &strategist.suggestions,
                    previous_suggestions: &history.previous_suggestions,
                    rules: &module.critic_rules,
                };
                CriticAgent::new(runtime.clone()).run(&input).await
            })
            .await?;
        runner
            .check(PipelineStage::Critic, ctx.record_critic(critic.clone()))
            .await?;

        let similarity = runner
            .run(PipelineStage::SimilarityFilter, async {
                let service = SimilarityService::new(s.embedder.clone(), s.vector_store.clone());
                Ok(service
                    .filter(
                        critic.approved.clone(),
                        &request.store.id.to_string(),
                        s.config.similarity_threshold,
                    )
                    .await)
            })
            .await?;
        runner
            .check(PipelineStage::SimilarityFilter, ctx.record_similarity(similarity.clone()))
            .await?;

        let result = AnalysisResult {
            pipeline: PipelineKind::Full,
            health: analyst.health.clone(),
            alerts: analyst.alerts.clone(),
            opportunities: analyst.opportunities.clone(),
            metrics: analyst.metrics.clone(),
            niche: niche.niche.clone(),
            subcategory: niche.subcategory.clone(),
        };
        let drafts = similarity
            .kept
            .into_iter()
            .map(|kept| (kept.draft, kept.embedding))
            .collect();

        let persisted = runner
            .run(PipelineStage::Persist, async {
                let suggestions = persist(
                    s.repository.as_ref(),
                    request.analysis_id,
                    request.store.id,
                    &result,
                    drafts,
                    s.config.max_suggestions,
                )
                .await?;
                Ok(PersistSummary::from_suggestions(&suggestions))
            })
            .await?;

        tracing::info!(
            stages = ctx.completed_stages().len() + 1,
            suggestions = persisted.suggestion_ids.len(),
            duplicates = similarity.duplicates.len(),
            "Full pipeline completed"
        );

        Ok(AnalysisOutcome {
            analysis_id: request.analysis_id,
            overall_health: result.health,
            metrics: result.metrics,
            suggestions_count: persisted.suggestion_ids.len(),
            niche: result.niche,
            pipeline: PipelineKind::Full,
        })
    }

    async fn load_history(&self, request: &AnalysisRequest) -> DomainResult<HistoricalContext> {
        let s = &self.services;
        let stored_suggestions = s
            .repository
            .recent_suggestions(request.store.id, s.config.history_limit)
            .await?;
        let stored_analyses = s
            .repository
            .recent_analyses(request.store.id, request.analysis_id, s.config.history_limit)
            .await?;

        let (previous_suggestions, previous_analyses) = merge_history(
            &request.previous_suggestions,
            stored_suggestions,
            &request.previous_analyses,
            stored_analyses,
        );
        tracing::debug!(
            suggestions = previous_suggestions.len(),
            analyses = previous_analyses.len(),
            "Historical context loaded"
        );
        Ok(HistoricalContext {
            previous_suggestions,
            previous_analyses,
        })
    }

    async fn retrieve_benchmarks(&self, niche: &NicheMatch) -> DomainResult<BenchmarkContext> {
        let s = &self.services;
        let benchmarks = s.knowledge.catalog().benchmarks_for(&niche.niche).cloned();
        let query = format!("{} {} benchmarks", niche.niche, niche.subcategory);
        let documents = s
            .search_knowledge(&query, KnowledgeCategory::Benchmark, niche)
            .await?;
        Ok(BenchmarkContext { benchmarks, documents })
    }

    async fn collect(
        &self,
        runtime: &AgentRuntime,
        request: &AnalysisRequest,
        niche: &NicheMatch,
        history: &HistoricalContext,
        benchmarks: &BenchmarkContext,
        focus: &[String],
    ) -> DomainResult<CollectorOutput> {
        let s = &self.services;
        let (metrics, metrics_missing) = match s.metrics.collect(&request.store, &request.period).await {
            Ok(metrics) => (metrics, false),
            Err(e) if e.aborts_pipeline() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Store metrics unavailable, continuing with empty metrics");
                (StoreMetrics::default(), true)
            }
        };

        let input = CollectorInput {
            store: &request.store,
            period: &request.period,
            niche,
            metrics: &metrics,
            benchmarks: benchmarks.benchmarks.as_ref(),
            documents: &benchmarks.documents,
            previous_suggestions: &history.previous_suggestions,
            previous_analyses: &history.previous_analyses,
            focus,
        };
        let mut output = CollectorAgent::new(runtime.clone()).run(&input).await?;
        if metrics_missing {
            output.data_gaps.push(METRICS_UNAVAILABLE_GAP.to_string());
        }

        if s.config.synthesize_profile {
            let input = ProfileInput::new(&request.store, &metrics, niche, benchmarks.benchmarks.as_ref());
            output.profile = Some(ProfileSynthesizerAgent::new(runtime.clone()).run(&input).await?);
        }
        Ok(output)
    }
}

/// Retrieval query for strategy documents, built from the analyst's findings.
pub(crate) fn strategy_query(analyst: &AnalystOutput) -> String {
    let mut terms: Vec<&str> = analyst
        .alerts
        .iter()
        .map(|a| a.message.as_str())
        .chain(analyst.opportunities.iter().map(|o| o.title.as_str()))
        .filter(|t| !t.is_empty())
        .take(6)
        .collect();
    if terms.is_empty() {
        terms.push(analyst.health.classification.as_str());
    }
    terms.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Alert;
    use crate::services::agents::analyst;

    #[test]
    fn test_strategy_query_prefers_findings() {
        let mut out = analyst::normalize(None);
        assert_eq!(strategy_query(&out), "attention");

        out.alerts.push(Alert {
            kind: "stock".to_string(),
            severity: "high".to_string(),
            message: "best sellers sem estoque".to_string(),
        });
        assert_eq!(strategy_query(&out), "best sellers sem estoque");
    }
}

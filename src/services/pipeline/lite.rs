//! Reduced pipeline: one analyst call and one strategist call.
//!
//! No collector, no critic and no embedding work. The lookback window is
//! shortened and fewer suggestions are requested. Suggestions persist in the
//! same shape as the full pipeline's.

use tracing::instrument;

use super::{merge_history, persist, PersistSummary, PipelineServices};
use crate::domain::errors::PipelineError;
use crate::domain::models::{
    AnalysisOutcome, AnalysisRecord, AnalysisRequest, AnalysisResult, PipelineContext, PipelineKind,
    PipelineStage, Store, StoreMetrics,
};
use crate::services::agents::{
    AnalystInput, BenchmarkPosition, LiteAnalystAgent, LiteStrategistAgent, StrategistInput,
};
use crate::services::analysis_router::AnalysisRouter;

pub struct LitePipeline {
    services: PipelineServices,
}

impl LitePipeline {
    pub fn new(services: PipelineServices) -> Self {
        Self { services }
    }

    pub async fn run_lite(&self, store: &Store, record: &AnalysisRecord) -> Result<AnalysisOutcome, PipelineError> {
        self.run(AnalysisRequest::new(store, record)).await
    }

    #[instrument(
        name = "lite_pipeline",
        skip(self, request),
        fields(analysis_id = %request.analysis_id, store_id = %request.store.id)
    )]
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, PipelineError> {
        let s = &self.services;
        let runner = s.stage_runner(request.analysis_id);
        let module = AnalysisRouter::resolve(&request.analysis_type);
        let runtime = s.runtime();
        let period = request.period.clamp_to_days(s.config.lite_lookback_days);
        let max_suggestions = s.config.lite_max_suggestions;
        let mut ctx = PipelineContext::new();

        runner.start(PipelineStage::NicheIdentification).await?;
        tracing::info!(
            analysis_type = module.analysis_type.as_str(),
            lookback_days = period.days(),
            "Starting lite pipeline"
        );

        let niche = runner
            .run(PipelineStage::NicheIdentification, async {
                Ok(s.knowledge.identify_niche(&request.store).await)
            })
            .await?;
        runner
            .check(PipelineStage::NicheIdentification, ctx.record_niche(niche.clone()))
            .await?;
        let benchmarks = s.knowledge.catalog().benchmarks_for(&niche.niche).cloned();

        let analyst = runner
            .run(PipelineStage::Analyst, async {
                let metrics = match s.metrics.collect(&request.store, &period).await {
                    Ok(metrics) => metrics,
                    Err(e) if e.aborts_pipeline() => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "Store metrics unavailable, continuing with empty metrics");
                        StoreMetrics::default()
                    }
                };
                let input = AnalystInput {
                    store_name: &request.store.name,
                    period: &period,
                    niche: &niche,
                    metrics: &metrics,
                    collector_summary: None,
                    key_facts: &[],
                    benchmarks: benchmarks.as_ref(),
                    benchmark_position: BenchmarkPosition::compute(&metrics, benchmarks.as_ref()),
                    documents: &[],
                    previous_analyses: &request.previous_analyses,
                    keywords: &module.analyst_keywords,
                };
                LiteAnalystAgent::new(runtime.clone()).run(&input).await
            })
            .await?;
        runner
            .check(PipelineStage::Analyst, ctx.record_analyst(analyst.clone()))
            .await?;

        let strategist = runner
            .run(PipelineStage::Strategist, async {
                let stored = s
                    .repository
                    .recent_suggestions(request.store.id, s.config.history_limit)
                    .await?;
                let (previous_suggestions, _) =
                    merge_history(&request.previous_suggestions, stored, &[], Vec::new());

                let input = StrategistInput {
                    store_name: &request.store.name,
                    niche: &niche,
                    health: &analyst.health,
                    alerts: &analyst.alerts,
                    opportunities: &analyst.opportunities,
                    analysis: &analyst.metrics,
                    collector_summary: None,
                    profile: None,
                    strategies: &[],
                    previous_suggestions: &previous_suggestions,
                    exemplars: &module.strategist_exemplars,
                    max_suggestions,
                };
                LiteStrategistAgent::new(runtime.clone())
                    .run(&input, module.temperature_override)
                    .await
            })
            .await?;
        runner
            .check(PipelineStage::Strategist, ctx.record_strategist(strategist.clone()))
            .await?;

        let result = AnalysisResult {
            pipeline: PipelineKind::Lite,
            health: analyst.health.clone(),
            alerts: analyst.alerts.clone(),
            opportunities: analyst.opportunities.clone(),
            metrics: analyst.metrics.clone(),
            niche: niche.niche.clone(),
            subcategory: niche.subcategory.clone(),
        };
        let drafts = strategist
            .suggestions
            .into_iter()
            .map(|draft| (draft, None))
            .collect();

        let persisted = runner
            .run(PipelineStage::Persist, async {
                let suggestions = persist(
                    s.repository.as_ref(),
                    request.analysis_id,
                    request.store.id,
                    &result,
                    drafts,
                    max_suggestions,
                )
                .await?;
                Ok(PersistSummary::from_suggestions(&suggestions))
            })
            .await?;

        tracing::info!(
            stages = ctx.completed_stages().len() + 1,
            suggestions = persisted.suggestion_ids.len(),
            "Lite pipeline completed"
        );

        Ok(AnalysisOutcome {
            analysis_id: request.analysis_id,
            overall_health: result.health,
            metrics: result.metrics,
            suggestions_count: persisted.suggestion_ids.len(),
            niche: result.niche,
            pipeline: PipelineKind::Lite,
        })
    }
}

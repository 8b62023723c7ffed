//! `storelens analyze`: run the full or lite pipeline for one store.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::context::AppContext;
use crate::cli::output::progress::create_spinner;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{
    AnalysisOutcome, AnalysisPeriod, AnalysisRecord, Config, Store, Suggestion, MAX_LOOKBACK_DAYS,
};
use crate::domain::ports::AnalysisRepository;
use crate::services::{FullPipeline, LitePipeline};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Store description (JSON)
    #[arg(short, long)]
    pub store: PathBuf,

    /// Aggregated store metrics (JSON)
    #[arg(short, long)]
    pub metrics: PathBuf,

    /// Run the reduced two-call pipeline
    #[arg(long)]
    pub lite: bool,

    /// Analysis type (general, financial, conversion, competitors)
    #[arg(short = 't', long = "type", default_value = "general")]
    pub analysis_type: String,

    /// Lookback window in days (defaults to the configured window)
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=MAX_LOOKBACK_DAYS))]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub success: bool,
    pub outcome: AnalysisOutcome,
    pub suggestions: Vec<Suggestion>,
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        let o = &self.outcome;
        let mut lines = vec![
            format!("Analysis {} ({} pipeline)", o.analysis_id, o.pipeline.as_str()),
            format!("Niche: {}", o.niche),
            format!(
                "Health: {} ({})",
                o.overall_health.score, o.overall_health.classification
            ),
        ];
        for point in &o.overall_health.main_points {
            lines.push(format!("  - {}", point));
        }

        if self.suggestions.is_empty() {
            lines.push("No suggestions were produced.".to_string());
        } else {
            lines.push(format!("\n{} suggestion(s):", o.suggestions_count));
            lines.push(TableFormatter::new().format_suggestions(&self.suggestions));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: AnalyzeArgs, config: Config, json_mode: bool) -> Result<()> {
    let store = read_store(&args.store)?;
    let days = args
        .days
        .unwrap_or(config.pipeline.full_lookback_days)
        .clamp(1, MAX_LOOKBACK_DAYS);

    let ctx = AppContext::open(config).await?;
    let services = ctx.pipeline_services(&args.metrics)?;

    let record = AnalysisRecord::new(
        store.id,
        args.analysis_type.clone(),
        AnalysisPeriod::last_days(days, Utc::now()),
    );
    ctx.analyses.create(&record).await?;

    let spinner = create_spinner(format!("Analyzing {}", store.name), json_mode);
    let result = if args.lite {
        LitePipeline::new(services).run_lite(&store, &record).await
    } else {
        FullPipeline::new(services).run_full(&store, &record).await
    };
    spinner.finish_and_clear();

    let outcome = result?;
    let suggestions = ctx.analyses.suggestions_for(outcome.analysis_id).await?;

    output(
        &AnalyzeOutput {
            success: true,
            outcome,
            suggestions,
        },
        json_mode,
    );
    Ok(())
}

fn read_store(path: &Path) -> Result<Store> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid store file {}", path.display()))
}

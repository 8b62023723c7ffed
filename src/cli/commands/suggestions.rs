//! `storelens suggestions`: list what an analysis persisted.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{AnalysisRecord, Config, Suggestion};
use crate::domain::ports::AnalysisRepository;

#[derive(Args, Debug)]
pub struct SuggestionsArgs {
    /// Analysis ID
    pub analysis_id: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsOutput {
    pub analysis: AnalysisRecord,
    pub suggestions: Vec<Suggestion>,
}

impl CommandOutput for SuggestionsOutput {
    fn to_human(&self) -> String {
        let a = &self.analysis;
        let mut out = format!("Analysis {} [{}]", a.id, a.status.as_str());
        if let (Some(stage), Some(message)) = (&a.failed_stage, &a.error_message) {
            out.push_str(&format!("\nFailed at {}: {}", stage, message));
        }
        if self.suggestions.is_empty() {
            out.push_str("\nNo suggestions.");
        } else {
            out.push('\n');
            out.push_str(&TableFormatter::new().format_suggestions(&self.suggestions));
        }
        out
    }
}

pub async fn execute(args: SuggestionsArgs, config: Config, json_mode: bool) -> Result<()> {
    let id = Uuid::parse_str(&args.analysis_id)
        .with_context(|| format!("Invalid analysis ID: {}", args.analysis_id))?;

    let ctx = AppContext::open(config).await?;
    let analysis = ctx
        .analyses
        .get(id)
        .await?
        .ok_or_else(|| anyhow!("Analysis not found: {}", id))?;
    let suggestions = ctx.analyses.suggestions_for(id).await?;

    output(
        &SuggestionsOutput {
            analysis,
            suggestions,
        },
        json_mode,
    );
    Ok(())
}

//! Knowledge base CLI commands.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, KnowledgeCategory, KnowledgeHit};
use crate::services::knowledge_base::parse_documents_yaml;
use crate::services::ImportReport;

#[derive(Args, Debug)]
pub struct KnowledgeArgs {
    #[command(subcommand)]
    pub command: KnowledgeCommands,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeCommands {
    /// Import documents from a YAML file, embedding them when possible
    Import {
        /// YAML file with a `documents` list
        file: PathBuf,
    },
    /// Search documents
    Search {
        /// Free-text query
        query: String,
        /// Category (benchmark, strategy, case)
        #[arg(short, long, default_value = "strategy")]
        category: String,
        /// Restrict to a niche (general documents are always included)
        #[arg(short, long)]
        niche: Option<String>,
        /// Subcategory used by the attribute fallback
        #[arg(short, long)]
        subcategory: Option<String>,
        /// Maximum results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub success: bool,
    pub report: ImportReport,
}

impl CommandOutput for ImportOutput {
    fn to_human(&self) -> String {
        format!(
            "Imported {} document(s), {} embedded",
            self.report.total, self.report.embedded
        )
    }
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub hits: Vec<KnowledgeHit>,
    pub total: usize,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.hits.is_empty() {
            return "No documents found.".to_string();
        }
        let mut out = TableFormatter::new().format_knowledge_hits(&self.hits);
        out.push_str(&format!("\n\nShowing {} document(s)", self.total));
        out
    }
}

pub async fn execute(args: KnowledgeArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        KnowledgeCommands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let documents = parse_documents_yaml(&raw)?;
            let report = ctx.knowledge.import(documents).await?;
            output(
                &ImportOutput {
                    success: true,
                    report,
                },
                json_mode,
            );
        }
        KnowledgeCommands::Search {
            query,
            category,
            niche,
            subcategory,
            limit,
        } => {
            let category = KnowledgeCategory::from_str(&category)
                .ok_or_else(|| anyhow!("Unknown category: {}", category))?;
            let hits = ctx
                .knowledge
                .search(&query, category, niche.as_deref(), subcategory.as_deref(), limit)
                .await?;
            output(
                &SearchOutput {
                    total: hits.len(),
                    hits,
                },
                json_mode,
            );
        }
    }

    Ok(())
}

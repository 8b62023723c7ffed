//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::{analyze, extract, knowledge, route, suggestions};

#[derive(Parser)]
#[command(name = "storelens")]
#[command(about = "StoreLens - multi-agent e-commerce store analysis", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .storelens/config.yaml)
    #[arg(short, long, global = true, env = "STORELENS_CONFIG")]
    pub config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an analysis for a store
    Analyze(analyze::AnalyzeArgs),

    /// Show the specialization bundle for an analysis type
    Route(route::RouteArgs),

    /// Recover a JSON payload from raw model output
    Extract(extract::ExtractArgs),

    /// Knowledge base management
    Knowledge(knowledge::KnowledgeArgs),

    /// List suggestions persisted by an analysis
    Suggestions(suggestions::SuggestionsArgs),
}

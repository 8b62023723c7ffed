//! `storelens route`: show the specialization bundle for an analysis type.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::ModuleConfig;
use crate::services::AnalysisRouter;

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Analysis type, e.g. financial or conversao
    pub analysis_type: String,
}

#[derive(Debug, Serialize)]
pub struct RouteOutput {
    pub requested: String,
    pub module: ModuleConfig,
}

impl CommandOutput for RouteOutput {
    fn to_human(&self) -> String {
        let m = &self.module;
        let mut lines = vec![format!(
            "{} -> {}{}",
            self.requested,
            m.analysis_type.as_str(),
            if m.is_specialized { " (specialized)" } else { "" }
        )];

        let sections: [(&str, &Vec<String>); 4] = [
            ("Collector focus", &m.collector_focus),
            ("Analyst keywords", &m.analyst_keywords),
            ("Strategist exemplars", &m.strategist_exemplars),
            ("Critic rules", &m.critic_rules),
        ];
        for (name, items) in sections {
            if !items.is_empty() {
                lines.push(format!("{}:", name));
                lines.extend(items.iter().map(|i| format!("  - {}", i)));
            }
        }
        if let Some(t) = m.temperature_override {
            lines.push(format!("Strategist temperature: {:.2}", t));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: RouteArgs, json_mode: bool) -> Result<()> {
    let module = AnalysisRouter::resolve(&args.analysis_type);
    output(
        &RouteOutput {
            requested: args.analysis_type,
            module,
        },
        json_mode,
    );
    Ok(())
}

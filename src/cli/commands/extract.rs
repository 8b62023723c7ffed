//! `storelens extract`: run JSON recovery over a saved model response.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::services::JsonExtractor;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// File holding the raw response; reads stdin when omitted
    pub file: Option<PathBuf>,

    /// Label attached to log lines
    #[arg(short, long, default_value = "cli")]
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    pub strategy: String,
    pub possibly_incomplete: bool,
    pub value: serde_json::Value,
}

impl CommandOutput for ExtractOutput {
    fn to_human(&self) -> String {
        let body = serde_json::to_string_pretty(&self.value).unwrap_or_default();
        let note = if self.possibly_incomplete {
            " (repaired, may be incomplete)"
        } else {
            ""
        };
        format!("Strategy: {}{}\n{}", self.strategy, note, body)
    }
}

pub async fn execute(args: ExtractArgs, json_mode: bool) -> Result<()> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let Some(extraction) = JsonExtractor::extract_detailed(&text, &args.label) else {
        bail!("No JSON payload could be recovered");
    };

    output(
        &ExtractOutput {
            strategy: extraction.strategy.as_str().to_string(),
            possibly_incomplete: extraction.strategy.possibly_incomplete(),
            value: extraction.value,
        },
        json_mode,
    );
    Ok(())
}

//! Analysis specialization bundles.

use serde::{Deserialize, Serialize};

/// Kind of analysis requested for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    General,
    Financial,
    Conversion,
    Competitors,
}

impl AnalysisType {
    /// Parse an analysis type; unknown strings yield `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "general" | "geral" | "full" | "" => Some(AnalysisType::General),
            "financial" | "finance" | "financeiro" => Some(AnalysisType::Financial),
            "conversion" | "conversao" | "conversão" | "cro" => Some(AnalysisType::Conversion),
            "competitors" | "competitor" | "competition" | "concorrentes" | "concorrencia" => {
                Some(AnalysisType::Competitors)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::General => "general",
            AnalysisType::Financial => "financial",
            AnalysisType::Conversion => "conversion",
            AnalysisType::Competitors => "competitors",
        }
    }
}

/// Prompt specialization overrides for one analysis type.
///
/// The empty bundle is the generic behavior; every agent accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModuleConfig {
    pub analysis_type: AnalysisType,
    pub is_specialized: bool,
    /// Extra fields the Collector should emphasise.
    pub collector_focus: Vec<String>,
    /// Keywords the Analyst should weigh.
    pub analyst_keywords: Vec<String>,
    /// Example suggestions handed to the Strategist.
    pub strategist_exemplars: Vec<String>,
    /// Additional validation rules for the Critic.
    pub critic_rules: Vec<String>,
    /// Strategist temperature override.
    pub temperature_override: Option<f32>,
}

impl ModuleConfig {
    pub fn general() -> Self {
        Self::default()
    }

    /// True when no override of any kind is present.
    pub fn has_no_overrides(&self) -> bool {
        self.collector_focus.is_empty()
            && self.analyst_keywords.is_empty()
            && self.strategist_exemplars.is_empty()
            && self.critic_rules.is_empty()
            && self.temperature_override.is_none()
    }
}

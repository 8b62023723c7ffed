//! Analysis records, requests and outcomes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::suggestion::PreviousSuggestion;

/// Identity of the store being analysed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    /// Niche already known for this store; skips identification when set.
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Category labels from the store's catalog.
    #[serde(default)]
    pub category_labels: Vec<String>,
    /// Best-selling product titles, used for niche identification.
    #[serde(default)]
    pub top_product_titles: Vec<String>,
}

impl Store {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            domain: None,
            niche: None,
            subcategory: None,
            category_labels: Vec::new(),
            top_product_titles: Vec::new(),
        }
    }
}

/// Longest lookback window an analysis may cover.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Inclusive time window an analysis covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `days` ending at `end`, with `days` clamped to
    /// `0..=MAX_LOOKBACK_DAYS`.
    pub fn last_days(days: i64, end: DateTime<Utc>) -> Self {
        let days = days.clamp(0, MAX_LOOKBACK_DAYS);
        let start = end
            .checked_sub_signed(Duration::days(days))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Shorten the window to at most `days`, keeping the same end.
    pub fn clamp_to_days(&self, days: i64) -> Self {
        if self.days() <= days {
            *self
        } else {
            Self::last_days(days, self.end)
        }
    }
}

/// Processing status of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisStatus::Pending),
            "processing" => Some(AnalysisStatus::Processing),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }
}

/// Health classification of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthClassification {
    Critical,
    Attention,
    Good,
    Excellent,
}

impl HealthClassification {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => HealthClassification::Excellent,
            60..=79 => HealthClassification::Good,
            40..=59 => HealthClassification::Attention,
            _ => HealthClassification::Critical,
        }
    }

    /// Parse a model-provided label, including Portuguese variants.
    pub fn parse(raw: &str) -> Option<Self> {
        match super::suggestion::normalize_label(raw).as_str() {
            "critical" | "critico" | "critica" => Some(HealthClassification::Critical),
            "attention" | "atencao" | "warning" | "regular" => Some(HealthClassification::Attention),
            "good" | "bom" | "boa" | "saudavel" | "healthy" => Some(HealthClassification::Good),
            "excellent" | "excelente" | "otimo" | "otima" => Some(HealthClassification::Excellent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthClassification::Critical => "critical",
            HealthClassification::Attention => "attention",
            HealthClassification::Good => "good",
            HealthClassification::Excellent => "excellent",
        }
    }
}

impl std::fmt::Display for HealthClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall store health as judged by the Analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub score: u8,
    pub classification: HealthClassification,
    #[serde(default)]
    pub main_points: Vec<String>,
}

pub const DEFAULT_HEALTH_SCORE: u8 = 50;

impl Default for HealthSummary {
    fn default() -> Self {
        Self {
            score: DEFAULT_HEALTH_SCORE,
            classification: HealthClassification::Attention,
            main_points: Vec::new(),
        }
    }
}

/// An alert raised by the Analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub message: String,
}

/// An opportunity spotted by the Analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Opportunity {
    pub title: String,
    pub description: String,
    pub potential_impact: String,
}

/// Which pipeline variant produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Full,
    Lite,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Full => "full",
            PipelineKind::Lite => "lite",
        }
    }
}

/// The persisted analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub analysis_type: String,
    pub status: AnalysisStatus,
    pub period: AnalysisPeriod,
    pub pipeline: Option<PipelineKind>,
    pub health: Option<HealthSummary>,
    pub niche: Option<String>,
    pub failed_stage: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    pub fn new(store_id: Uuid, analysis_type: impl Into<String>, period: AnalysisPeriod) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            analysis_type: analysis_type.into(),
            status: AnalysisStatus::Pending,
            period,
            pipeline: None,
            health: None,
            niche: None,
            failed_stage: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// An earlier analysis of the same store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousAnalysis {
    pub id: Uuid,
    pub health_score: Option<u8>,
    pub classification: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input bundle for one pipeline run. Built once, never mutated by stages.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub store: Store,
    pub analysis_id: Uuid,
    pub analysis_type: String,
    pub period: AnalysisPeriod,
    pub previous_suggestions: Vec<PreviousSuggestion>,
    pub previous_analyses: Vec<PreviousAnalysis>,
}

impl AnalysisRequest {
    pub fn new(store: &Store, record: &AnalysisRecord) -> Self {
        Self {
            store: store.clone(),
            analysis_id: record.id,
            analysis_type: record.analysis_type.clone(),
            period: record.period,
            previous_suggestions: Vec::new(),
            previous_analyses: Vec::new(),
        }
    }

    pub fn with_history(
        mut self,
        suggestions: Vec<PreviousSuggestion>,
        analyses: Vec<PreviousAnalysis>,
    ) -> Self {
        self.previous_suggestions = suggestions;
        self.previous_analyses = analyses;
        self
    }
}

/// What gets written when an analysis completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub pipeline: PipelineKind,
    pub health: HealthSummary,
    pub alerts: Vec<Alert>,
    pub opportunities: Vec<Opportunity>,
    pub metrics: serde_json::Value,
    pub niche: String,
    pub subcategory: String,
}

/// Returned to callers of either pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub analysis_id: Uuid,
    pub overall_health: HealthSummary,
    pub metrics: serde_json::Value,
    pub suggestions_count: usize,
    pub niche: String,
    pub pipeline: PipelineKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_from_score_boundaries() {
        assert_eq!(HealthClassification::from_score(100), HealthClassification::Excellent);
        assert_eq!(HealthClassification::from_score(80), HealthClassification::Excellent);
        assert_eq!(HealthClassification::from_score(79), HealthClassification::Good);
        assert_eq!(HealthClassification::from_score(50), HealthClassification::Attention);
        assert_eq!(HealthClassification::from_score(39), HealthClassification::Critical);
    }

    #[test]
    fn test_classification_parse_localized() {
        assert_eq!(HealthClassification::parse("Atenção"), Some(HealthClassification::Attention));
        assert_eq!(HealthClassification::parse("EXCELENTE"), Some(HealthClassification::Excellent));
        assert_eq!(HealthClassification::parse("meh"), None);
    }

    #[test]
    fn test_default_health_is_attention_50() {
        let health = HealthSummary::default();
        assert_eq!(health.score, 50);
        assert_eq!(health.classification, HealthClassification::Attention);
    }

    #[test]
    fn test_period_clamp() {
        let end = Utc::now();
        let period = AnalysisPeriod::last_days(90, end);
        assert_eq!(period.days(), 90);
        let lite = period.clamp_to_days(30);
        assert_eq!(lite.days(), 30);
        assert_eq!(lite.end, end);
        assert_eq!(AnalysisPeriod::last_days(7, end).clamp_to_days(30).days(), 7);
    }

    #[test]
    fn test_period_lookback_is_bounded() {
        let end = Utc::now();
        assert_eq!(AnalysisPeriod::last_days(1_000_000_000, end).days(), MAX_LOOKBACK_DAYS);
        assert_eq!(AnalysisPeriod::last_days(i64::MAX, end).days(), MAX_LOOKBACK_DAYS);
        assert_eq!(AnalysisPeriod::last_days(-5, end).days(), 0);
    }
}

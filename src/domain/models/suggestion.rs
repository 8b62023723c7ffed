//! Suggestion domain model and the normalization tables for its enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Maximum persisted title length, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Expected impact of applying a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedImpact {
    High,
    #[default]
    Medium,
    Low,
}

const HIGH_SYNONYMS: &[&str] = &[
    "high", "alto", "alta", "elevado", "elevada", "very high", "muito alto", "muito alta",
    "alto impacto", "high impact", "h",
];

const MEDIUM_SYNONYMS: &[&str] = &[
    "medium", "medio", "media", "moderate", "moderado", "moderada", "mid", "medio impacto",
    "medium impact", "m",
];

const LOW_SYNONYMS: &[&str] = &[
    "low", "baixo", "baixa", "bajo", "baja", "minor", "pequeno", "baixo impacto", "low impact",
    "l",
];

impl ExpectedImpact {
    /// Normalize a free-form impact label.
    ///
    /// Matching is case-insensitive, accent-insensitive and tolerant of
    /// Latin-1 mojibake. Anything outside the synonym table is `Medium`.
    pub fn parse(raw: &str) -> Self {
        let key = normalize_label(raw);
        if HIGH_SYNONYMS.contains(&key.as_str()) {
            ExpectedImpact::High
        } else if LOW_SYNONYMS.contains(&key.as_str()) {
            ExpectedImpact::Low
        } else if MEDIUM_SYNONYMS.contains(&key.as_str()) {
            ExpectedImpact::Medium
        } else {
            ExpectedImpact::default()
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedImpact::High => "high",
            ExpectedImpact::Medium => "medium",
            ExpectedImpact::Low => "low",
        }
    }

    /// Sort weight, higher first.
    pub fn weight(&self) -> u8 {
        match self {
            ExpectedImpact::High => 3,
            ExpectedImpact::Medium => 2,
            ExpectedImpact::Low => 1,
        }
    }
}

impl std::fmt::Display for ExpectedImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggestion category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Inventory,
    Pricing,
    Products,
    Customers,
    Conversion,
    Marketing,
    Coupons,
    Operational,
    Financial,
    Other,
}

const CATEGORY_TABLE: &[(SuggestionCategory, &[&str])] = &[
    (SuggestionCategory::Inventory, &["inventory", "stock", "estoque", "inventario"]),
    (SuggestionCategory::Pricing, &["pricing", "price", "prices", "preco", "precos", "precificacao"]),
    (SuggestionCategory::Products, &["products", "product", "produto", "produtos", "catalog", "catalogo", "mix"]),
    (SuggestionCategory::Customers, &["customers", "customer", "cliente", "clientes", "retention", "retencao", "fidelizacao", "loyalty"]),
    (SuggestionCategory::Conversion, &["conversion", "conversao", "checkout", "cro", "funnel", "funil"]),
    (SuggestionCategory::Marketing, &["marketing", "promotion", "promocao", "campaign", "campanha", "ads"]),
    (SuggestionCategory::Coupons, &["coupons", "coupon", "cupom", "cupons", "discount", "discounts", "desconto", "descontos"]),
    (SuggestionCategory::Operational, &["operational", "operations", "operacional", "logistics", "logistica", "shipping", "frete"]),
    (SuggestionCategory::Financial, &["financial", "finance", "financeiro", "revenue", "receita", "margin", "margem"]),
    (SuggestionCategory::Other, &["other", "outro", "outros", "general", "geral"]),
];

impl SuggestionCategory {
    /// Normalize a category label. Empty input yields `None`; unknown labels
    /// map to `Other`.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize_label(raw);
        if key.is_empty() {
            return None;
        }
        let found = CATEGORY_TABLE
            .iter()
            .find(|(_, synonyms)| synonyms.contains(&key.as_str()))
            .map(|(category, _)| *category);
        Some(found.unwrap_or(SuggestionCategory::Other))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionCategory::Inventory => "inventory",
            SuggestionCategory::Pricing => "pricing",
            SuggestionCategory::Products => "products",
            SuggestionCategory::Customers => "customers",
            SuggestionCategory::Conversion => "conversion",
            SuggestionCategory::Marketing => "marketing",
            SuggestionCategory::Coupons => "coupons",
            SuggestionCategory::Operational => "operational",
            SuggestionCategory::Financial => "financial",
            SuggestionCategory::Other => "other",
        }
    }
}

/// Lifecycle status of a persisted suggestion. The pipeline only ever
/// writes `Pending`; later transitions belong to the user-facing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Ignored,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::InProgress => "in_progress",
            SuggestionStatus::Completed => "completed",
            SuggestionStatus::Ignored => "ignored",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(SuggestionStatus::Pending),
            "in_progress" => Some(SuggestionStatus::InProgress),
            "completed" => Some(SuggestionStatus::Completed),
            "ignored" => Some(SuggestionStatus::Ignored),
            _ => None,
        }
    }
}

/// In-memory suggestion produced by the Strategist and refined by the Critic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionDraft {
    pub category: SuggestionCategory,
    pub title: String,
    pub description: String,
    pub recommended_action: String,
    pub expected_impact: ExpectedImpact,
    #[serde(default)]
    pub target_metrics: Vec<String>,
    #[serde(default)]
    pub supporting_data: serde_json::Value,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl SuggestionDraft {
    /// Text used for semantic deduplication.
    pub fn similarity_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }
}

/// The persisted suggestion shape. Full and lite pipelines both write this
/// exact record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub store_id: Uuid,
    pub category: SuggestionCategory,
    pub title: String,
    pub description: String,
    pub recommended_action: String,
    pub expected_impact: ExpectedImpact,
    pub target_metrics: Vec<String>,
    pub specific_data: serde_json::Value,
    pub justification: String,
    pub priority: u32,
    pub status: SuggestionStatus,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Suggestion {
    /// Build a persistable record, rejecting drafts with empty required text.
    pub fn from_draft(
        draft: SuggestionDraft,
        analysis_id: Uuid,
        store_id: Uuid,
        embedding: Option<Vec<f32>>,
    ) -> DomainResult<Self> {
        if draft.title.trim().is_empty() || draft.description.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "suggestion requires a title and a description".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            analysis_id,
            store_id,
            category: draft.category,
            title: truncate_chars(draft.title.trim(), MAX_TITLE_CHARS),
            description: draft.description,
            recommended_action: draft.recommended_action,
            expected_impact: draft.expected_impact,
            target_metrics: draft.target_metrics,
            specific_data: draft.supporting_data,
            justification: draft.justification,
            priority: draft.priority,
            status: SuggestionStatus::Pending,
            embedding,
            created_at: Utc::now(),
        })
    }
}

/// A suggestion from an earlier run, used for history and deduplication prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousSuggestion {
    pub title: String,
    pub category: String,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Lowercase, repair mojibake, fold accents, and collapse separators.
pub(crate) fn normalize_label(raw: &str) -> String {
    let repaired = repair_mojibake(raw.trim());
    let folded: String = repaired
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Undo UTF-8 text that was decoded as Latin-1 (`mÃ©dio` -> `médio`).
fn repair_mojibake(s: &str) -> String {
    if !s.contains(['Ã', 'Â']) || s.chars().any(|c| c as u32 > 0xFF) {
        return s.to_string();
    }
    let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
    String::from_utf8(bytes).unwrap_or_else(|_| s.to_string())
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

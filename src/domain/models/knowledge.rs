//! Knowledge base documents and retrieval results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Niche key used for documents that apply to every store.
pub const GENERAL_NICHE: &str = "general";

/// Kind of knowledge document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeCategory {
    Benchmark,
    Strategy,
    Case,
}

impl KnowledgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeCategory::Benchmark => "benchmark",
            KnowledgeCategory::Strategy => "strategy",
            KnowledgeCategory::Case => "case",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "benchmark" | "benchmarks" => Some(KnowledgeCategory::Benchmark),
            "strategy" | "strategies" => Some(KnowledgeCategory::Strategy),
            "case" | "cases" | "case_study" => Some(KnowledgeCategory::Case),
            _ => None,
        }
    }

    pub fn all() -> [KnowledgeCategory; 3] {
        [KnowledgeCategory::Benchmark, KnowledgeCategory::Strategy, KnowledgeCategory::Case]
    }
}

/// A stored knowledge document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: KnowledgeCategory,
    #[serde(default = "default_niche")]
    pub niche: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_niche() -> String {
    GENERAL_NICHE.to_string()
}

impl KnowledgeDocument {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: KnowledgeCategory,
        niche: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            category,
            niche: niche.into(),
            subcategory: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Text that gets embedded for this document.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

/// A retrieval result, most relevant first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub title: String,
    pub content: String,
    pub category: KnowledgeCategory,
    pub niche: String,
    pub subcategory: Option<String>,
    pub relevance: f32,
    pub metadata: serde_json::Value,
}

impl KnowledgeHit {
    pub fn from_document(doc: KnowledgeDocument, relevance: f32) -> Self {
        Self {
            title: doc.title,
            content: doc.content,
            category: doc.category,
            niche: doc.niche,
            subcategory: doc.subcategory,
            relevance,
            metadata: doc.metadata,
        }
    }
}

/// How a store's niche was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NicheSource {
    Provided,
    VectorVote,
    KeywordMatch,
    Default,
}

/// Result of niche identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheMatch {
    pub niche: String,
    pub subcategory: String,
    pub source: NicheSource,
}

impl NicheMatch {
    pub fn general() -> Self {
        Self {
            niche: GENERAL_NICHE.to_string(),
            subcategory: GENERAL_NICHE.to_string(),
            source: NicheSource::Default,
        }
    }
}

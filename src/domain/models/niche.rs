//! Niche catalog: benchmark ranges and subcategory vocabularies per niche.
//!
//! The catalog is data, not code. A default ships in `data/niches.yaml` and
//! can be replaced at runtime through `knowledge.niches_file`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};

use super::knowledge::GENERAL_NICHE;

const BUILTIN_CATALOG: &str = include_str!("../../../data/niches.yaml");

const LABEL_WEIGHT: u32 = 3;
const KEY_WEIGHT: u32 = 2;
const KEYWORD_WEIGHT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// "below", "within" or "above".
    pub fn position(&self, value: f64) -> &'static str {
        if value < self.min {
            "below"
        } else if value > self.max {
            "above"
        } else {
            "within"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheBenchmarks {
    pub average_ticket: Range,
    pub conversion_rate: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryProfile {
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheProfile {
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub benchmarks: NicheBenchmarks,
    #[serde(default)]
    pub subcategories: BTreeMap<String, SubcategoryProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheCatalog {
    pub niches: BTreeMap<String, NicheProfile>,
}

impl NicheCatalog {
    /// Catalog compiled into the binary.
    pub fn builtin() -> DomainResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(yaml: &str) -> DomainResult<Self> {
        let catalog: NicheCatalog = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::SerializationError(format!("invalid niche catalog: {}", e)))?;
        if !catalog.niches.contains_key(GENERAL_NICHE) {
            return Err(DomainError::ValidationFailed(
                "niche catalog must define a 'general' niche".to_string(),
            ));
        }
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> DomainResult<Self> {
        let yaml = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DomainError::ValidationFailed(format!(
                "cannot read niche catalog {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn get(&self, niche: &str) -> Option<&NicheProfile> {
        self.niches.get(niche)
    }

    pub fn contains(&self, niche: &str) -> bool {
        self.niches.contains_key(niche)
    }

    /// Benchmarks for a niche, falling back to the general niche.
    pub fn benchmarks_for(&self, niche: &str) -> Option<&NicheBenchmarks> {
        self.get(niche)
            .or_else(|| self.get(GENERAL_NICHE))
            .map(|profile| &profile.benchmarks)
    }

    /// Best niche by keyword containment, when vectors are unavailable.
    pub fn match_niche_by_keywords(&self, context: &str) -> Option<String> {
        let haystack = context.to_lowercase();
        self.niches
            .iter()
            .filter(|(key, _)| key.as_str() != GENERAL_NICHE)
            .map(|(key, profile)| {
                let score = score_terms(&haystack, key, &profile.label, &profile.keywords);
                (key, score)
            })
            .filter(|(_, score)| *score > 0)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(key, _)| key.clone())
    }

    /// Pick the subcategory of `niche` that best matches `context`.
    ///
    /// Label hits outweigh key hits, which outweigh individual keyword hits.
    /// Returns the catch-all `general` subcategory when nothing scores.
    pub fn refine_subcategory(&self, niche: &str, context: &str) -> String {
        let Some(profile) = self.get(niche) else {
            return GENERAL_NICHE.to_string();
        };
        let haystack = context.to_lowercase();

        profile
            .subcategories
            .iter()
            .filter(|(key, _)| key.as_str() != GENERAL_NICHE)
            .map(|(key, sub)| (key, score_terms(&haystack, key, &sub.label, &sub.keywords)))
            .filter(|(_, score)| *score > 0)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(key, _)| key.clone())
            .unwrap_or_else(|| GENERAL_NICHE.to_string())
    }
}

fn score_terms(haystack: &str, key: &str, label: &str, keywords: &[String]) -> u32 {
    let mut score = 0;
    let label = label.to_lowercase();
    if !label.is_empty() && haystack.contains(&label) {
        score += LABEL_WEIGHT;
    }
    let key_phrase = key.replace('_', " ").to_lowercase();
    if haystack.contains(&key_phrase) {
        score += KEY_WEIGHT;
    }
    score += keywords
        .iter()
        .filter(|kw| !kw.is_empty() && haystack.contains(&kw.to_lowercase()))
        .count() as u32
        * KEYWORD_WEIGHT;
    score
}

//! Profile synthesizer: positioning, audience and price tier of a store.

use serde::Serialize;
use serde_json::Value;

use super::{string_field, string_list, AgentRuntime, AgentTuning};
use crate::domain::errors::DomainResult;
use crate::domain::models::{NicheBenchmarks, NicheMatch, Store, StoreMetrics, StoreProfile};
use crate::domain::ports::PromptKind;

const TUNING: AgentTuning = AgentTuning::new(0.4, 1024);

#[derive(Debug, Clone, Serialize)]
pub struct ProfileInput<'a> {
    pub store_name: &'a str,
    pub category_labels: &'a [String],
    pub top_sellers: Vec<String>,
    pub average_ticket: f64,
    pub niche: &'a NicheMatch,
    pub benchmarks: Option<&'a NicheBenchmarks>,
}

impl<'a> ProfileInput<'a> {
    pub fn new(
        store: &'a Store,
        metrics: &StoreMetrics,
        niche: &'a NicheMatch,
        benchmarks: Option<&'a NicheBenchmarks>,
    ) -> Self {
        let mut top_sellers = metrics.top_seller_titles(10);
        if top_sellers.is_empty() {
            top_sellers = store.top_product_titles.iter().take(10).cloned().collect();
        }
        Self {
            store_name: &store.name,
            category_labels: &store.category_labels,
            top_sellers,
            average_ticket: metrics.orders.average_ticket,
            niche,
            benchmarks,
        }
    }
}

pub struct ProfileSynthesizerAgent {
    runtime: AgentRuntime,
}

impl ProfileSynthesizerAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub async fn run(&self, input: &ProfileInput<'_>) -> DomainResult<StoreProfile> {
        let extracted = self
            .runtime
            .call(PromptKind::ProfileSynthesizer, input, TUNING)
            .await?;
        Ok(normalize(extracted, input))
    }
}

/// Missing output falls back to a price tier inferred from the niche's
/// ticket range and empty descriptive fields.
pub fn normalize(extracted: Option<Value>, input: &ProfileInput<'_>) -> StoreProfile {
    let inferred_tier = infer_price_tier(input.average_ticket, input.benchmarks);

    let Some(raw) = extracted.filter(Value::is_object) else {
        return StoreProfile {
            price_tier: inferred_tier.to_string(),
            degraded: true,
            ..StoreProfile::default()
        };
    };

    let price_tier = normalize_price_tier(&string_field(&raw, "price_tier")).unwrap_or(inferred_tier);

    StoreProfile {
        positioning: string_field(&raw, "positioning"),
        target_audience: string_field(&raw, "target_audience"),
        price_tier: price_tier.to_string(),
        strengths: string_list(&raw, "strengths"),
        weaknesses: string_list(&raw, "weaknesses"),
        degraded: false,
    }
}

fn normalize_price_tier(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "budget" | "low" | "economico" | "econômico" | "popular" | "baixo" => Some("budget"),
        "mid" | "medium" | "middle" | "mid-range" | "medio" | "médio" | "intermediario" => Some("mid"),
        "premium" | "high" | "luxury" | "alto" | "luxo" => Some("premium"),
        _ => None,
    }
}

fn infer_price_tier(average_ticket: f64, benchmarks: Option<&NicheBenchmarks>) -> &'static str {
    match benchmarks {
        Some(b) if average_ticket > 0.0 => match b.average_ticket.position(average_ticket) {
            "below" => "budget",
            "above" => "premium",
            _ => "mid",
        },
        _ => "unknown",
    }
}

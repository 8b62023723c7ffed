//! Analyst agent: health score, alerts and opportunities.
//!
//! The response is deep-merged over [`metrics_skeleton`], so every key the
//! skeleton names exists downstream no matter what the model returned.

use serde::Serialize;
use serde_json::{json, Value};

use super::{as_f64, deep_merge, string_field, string_list, AgentRuntime, AgentTuning};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Alert, AnalysisPeriod, AnalystOutput, HealthClassification, HealthSummary, KnowledgeHit,
    NicheBenchmarks, NicheMatch, Opportunity, PreviousAnalysis, StoreMetrics, DEFAULT_HEALTH_SCORE,
};
use crate::domain::ports::PromptKind;

const TUNING: AgentTuning = AgentTuning::new(0.2, 4096);

/// Where the store's numbers fall against its niche ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkPosition {
    pub average_ticket: Option<&'static str>,
    pub conversion_rate: Option<&'static str>,
}

impl BenchmarkPosition {
    pub fn compute(metrics: &StoreMetrics, benchmarks: Option<&NicheBenchmarks>) -> Self {
        let Some(b) = benchmarks else {
            return Self {
                average_ticket: None,
                conversion_rate: None,
            };
        };
        Self {
            average_ticket: (metrics.orders.average_ticket > 0.0)
                .then(|| b.average_ticket.position(metrics.orders.average_ticket)),
            conversion_rate: metrics
                .conversion
                .as_ref()
                .filter(|c| c.visits > 0)
                .map(|c| b.conversion_rate.position(c.conversion_rate)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalystInput<'a> {
    pub store_name: &'a str,
    pub period: &'a AnalysisPeriod,
    pub niche: &'a NicheMatch,
    pub metrics: &'a StoreMetrics,
    pub collector_summary: Option<&'a str>,
    pub key_facts: &'a [String],
    pub benchmarks: Option<&'a NicheBenchmarks>,
    pub benchmark_position: BenchmarkPosition,
    pub documents: &'a [KnowledgeHit],
    pub previous_analyses: &'a [PreviousAnalysis],
    /// Module keywords to weigh.
    pub keywords: &'a [String],
}

pub struct AnalystAgent {
    runtime: AgentRuntime,
}

impl AnalystAgent {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub async fn run(&self, input: &AnalystInput<'_>) -> DomainResult<AnalystOutput> {
        let extracted = self.runtime.call(PromptKind::Analyst, input, TUNING).await?;
        Ok(normalize(extracted))
    }
}

/// Every key the analysis metrics object is guaranteed to carry.
pub fn metrics_skeleton() -> Value {
    json!({
        "overall_health": {
            "score": DEFAULT_HEALTH_SCORE,
            "classification": HealthClassification::Attention.as_str(),
            "main_points": [],
        },
        "financial": {
            "revenue": 0,
            "average_ticket": 0,
            "revenue_trend": "unknown",
        },
        "orders": {
            "total": 0,
            "cancellation_rate": 0,
        },
        "conversion": {
            "rate": null,
            "cart_abandonment_rate": null,
        },
        "inventory": {
            "out_of_stock": 0,
            "low_stock": 0,
            "without_sales": 0,
        },
        "customers": {
            "new": 0,
            "returning": 0,
            "repeat_rate": 0,
        },
        "coupons": {
            "used": 0,
            "discount_total": 0,
        },
        "benchmark_comparison": {},
        "anomalies": [],
        "alerts": [],
        "opportunities": [],
    })
}

/// Normalize an analyst (or lite analyst) response.
pub fn normalize(extracted: Option<Value>) -> AnalystOutput {
    let degraded = !extracted.as_ref().is_some_and(Value::is_object);
    let mut metrics = metrics_skeleton();
    if let Some(raw) = extracted.filter(Value::is_object) {
        deep_merge(&mut metrics, raw);
    }

    let health = health_from(&metrics["overall_health"]);
    metrics["overall_health"] = json!({
        "score": health.score,
        "classification": health.classification.as_str(),
        "main_points": health.main_points,
    });

    let alerts = alerts_from(&metrics["alerts"]);
    let opportunities = opportunities_from(&metrics["opportunities"]);

    AnalystOutput {
        metrics,
        health,
        alerts,
        opportunities,
        degraded,
    }
}

fn health_from(raw: &Value) -> HealthSummary {
    let score = raw
        .get("score")
        .and_then(as_f64)
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(DEFAULT_HEALTH_SCORE);

    let classification = HealthClassification::parse(&string_field(raw, "classification"))
        .unwrap_or_else(|| HealthClassification::from_score(score));

    HealthSummary {
        score,
        classification,
        main_points: string_list(raw, "main_points"),
    }
}

fn alerts_from(raw: &Value) -> Vec<Alert> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(message) if !message.trim().is_empty() => Some(Alert {
                kind: "general".to_string(),
                severity: "medium".to_string(),
                message: message.trim().to_string(),
            }),
            Value::Object(_) => serde_json::from_value::<Alert>(item.clone())
                .ok()
                .map(|mut alert| {
                    if alert.message.trim().is_empty() {
                        alert.message = string_field(item, "description");
                    }
                    alert
                })
                .filter(|alert| !alert.message.is_empty()),
            _ => None,
        })
        .collect()
}

fn opportunities_from(raw: &Value) -> Vec<Opportunity> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(title) if !title.trim().is_empty() => Some(Opportunity {
                title: title.trim().to_string(),
                ..Opportunity::default()
            }),
            Value::Object(_) => serde_json::from_value::<Opportunity>(item.clone())
                .ok()
                .filter(|o| !o.title.trim().is_empty() || !o.description.trim().is_empty()),
            _ => None,
        })
        .collect()
}

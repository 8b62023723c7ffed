//! Built-in prompt producer.
//!
//! Prompts are short and generic: a role line, the expected JSON shape, and
//! the agent's typed context serialized as JSON. Every prompt carries an
//! `[agent:<kind>]` marker on its first user line.

use serde_json::Value;

use crate::domain::ports::{PromptKind, PromptTemplates, RenderedPrompt};

/// Marker identifying which agent a prompt belongs to.
pub fn agent_marker(kind: PromptKind) -> String {
    format!("[agent:{}]", kind.as_str())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPromptTemplates;

impl DefaultPromptTemplates {
    pub fn new() -> Self {
        Self
    }
}

fn role(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Collector => {
            "You are the data collector of an e-commerce store analysis team. Summarize the store's metrics and history into facts the analyst can use."
        }
        PromptKind::ProfileSynthesizer => {
            "You describe an online store's market positioning from its catalog and sales data."
        }
        PromptKind::Analyst | PromptKind::LiteAnalyst => {
            "You are a senior e-commerce analyst. Judge the store's health from the metrics and benchmarks provided. Use only the numbers given."
        }
        PromptKind::Strategist | PromptKind::LiteStrategist => {
            "You are an e-commerce growth strategist. Propose concrete, measurable actions grounded in the analysis. Do not repeat earlier suggestions."
        }
        PromptKind::Critic => {
            "You review proposed store improvements. Approve only specific, feasible, non-repetitive suggestions and improve their wording."
        }
    }
}

fn response_shape(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Collector => {
            r#"{"summary": str, "key_facts": [str], "historical_insights": [str], "data_gaps": [str]}"#
        }
        PromptKind::ProfileSynthesizer => {
            r#"{"positioning": str, "target_audience": str, "price_tier": "budget|mid|premium", "strengths": [str], "weaknesses": [str]}"#
        }
        PromptKind::Analyst | PromptKind::LiteAnalyst => {
            r#"{"overall_health": {"score": 0-100, "classification": "critical|attention|good|excellent", "main_points": [str]}, "financial": {}, "orders": {}, "conversion": {}, "inventory": {}, "customers": {}, "coupons": {}, "benchmark_comparison": {}, "anomalies": [], "alerts": [{"type": str, "severity": str, "message": str}], "opportunities": [{"title": str, "description": str, "potential_impact": str}]}"#
        }
        PromptKind::Strategist | PromptKind::LiteStrategist => {
            r#"{"suggestions": [{"category": str, "title": str, "description": str, "recommended_action": str, "expected_impact": "high|medium|low", "target_metrics": [str], "supporting_data": {}, "justification": str, "priority": int}]}"#
        }
        PromptKind::Critic => {
            r#"{"approved_suggestions": [{"original_title": str, "final_version": {...suggestion fields}, "quality_score": 0-10}], "removed_suggestions": [{"title": str, "reason": str}], "observations": [str]}"#
        }
    }
}

impl PromptTemplates for DefaultPromptTemplates {
    fn render(&self, kind: PromptKind, context: &Value) -> RenderedPrompt {
        let context_json =
            serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
        let system = format!(
            "{}\nRespond with a single JSON object and nothing else, shaped as:\n{}",
            role(kind),
            response_shape(kind)
        );
        let user = format!("{}\nContext:\n```json\n{}\n```", agent_marker(kind), context_json);
        RenderedPrompt { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marker_and_context_embedded() {
        let prompt = DefaultPromptTemplates.render(PromptKind::LiteAnalyst, &json!({"store": "Loja"}));
        assert!(prompt.user.starts_with("[agent:lite_analyst]"));
        assert!(!prompt.user.contains("[agent:analyst]"));
        assert!(prompt.user.contains("\"store\": \"Loja\""));
        assert!(prompt.system.contains("overall_health"));
    }
}

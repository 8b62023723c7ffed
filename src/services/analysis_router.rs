//! Resolves an analysis type to its prompt specialization bundle.

use crate::domain::models::{AnalysisType, ModuleConfig};

/// Pure mapping from analysis type to [`ModuleConfig`].
///
/// `general` and any unrecognized type resolve to the empty, non-specialized
/// bundle.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisRouter;

impl AnalysisRouter {
    pub fn resolve(analysis_type: &str) -> ModuleConfig {
        match AnalysisType::from_str(analysis_type) {
            Some(AnalysisType::Financial) => financial(),
            Some(AnalysisType::Conversion) => conversion(),
            Some(AnalysisType::Competitors) => competitors(),
            Some(AnalysisType::General) => ModuleConfig::general(),
            None => {
                tracing::debug!(analysis_type, "Unknown analysis type, using general module");
                ModuleConfig::general()
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn financial() -> ModuleConfig {
    ModuleConfig {
        analysis_type: AnalysisType::Financial,
        is_specialized: true,
        collector_focus: strings(&[
            "gross_revenue",
            "net_revenue_after_discounts",
            "average_ticket_trend",
            "cancellation_losses",
            "coupon_discount_share",
        ]),
        analyst_keywords: strings(&["margin", "cash flow", "revenue concentration", "discount dependency"]),
        strategist_exemplars: strings(&[
            "Raise the free-shipping threshold to just above the current average ticket",
            "Replace blanket percentage coupons with minimum-order coupons",
            "Bundle slow movers with top sellers to lift ticket without discounting",
        ]),
        critic_rules: strings(&[
            "Every suggestion must name the revenue or margin metric it moves",
            "Reject suggestions that grow revenue only by deeper discounts",
        ]),
        temperature_override: Some(0.5),
    }
}

fn conversion() -> ModuleConfig {
    ModuleConfig {
        analysis_type: AnalysisType::Conversion,
        is_specialized: true,
        collector_focus: strings(&[
            "visits",
            "conversion_rate",
            "cart_abandonment_rate",
            "out_of_stock_top_sellers",
        ]),
        analyst_keywords: strings(&["funnel", "checkout friction", "abandonment", "product page"]),
        strategist_exemplars: strings(&[
            "Send a cart-recovery message within one hour of abandonment",
            "Show stock and delivery estimates on product pages of top sellers",
        ]),
        critic_rules: strings(&[
            "Every suggestion must target a funnel step and a conversion metric",
        ]),
        temperature_override: None,
    }
}

fn competitors() -> ModuleConfig {
    ModuleConfig {
        analysis_type: AnalysisType::Competitors,
        is_specialized: true,
        collector_focus: strings(&["price_positioning", "assortment_breadth", "niche_benchmarks"]),
        analyst_keywords: strings(&["price gap", "differentiation", "benchmark position"]),
        strategist_exemplars: strings(&[
            "Reprice the top five sellers to sit inside the niche ticket range",
            "Highlight an exclusive line competitors in the niche do not carry",
        ]),
        critic_rules: strings(&[
            "Comparisons must refer to niche benchmark ranges, not invented competitor data",
        ]),
        temperature_override: Some(0.6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_and_unknown_are_neutral() {
        for analysis_type in ["general", "unknown-type", "", "GERAL"] {
            let config = AnalysisRouter::resolve(analysis_type);
            assert!(!config.is_specialized, "{}", analysis_type);
            assert!(config.has_no_overrides(), "{}", analysis_type);
            assert_eq!(config.analysis_type, AnalysisType::General);
        }
    }

    #[test]
    fn test_specialized_modules() {
        let financial = AnalysisRouter::resolve("finance");
        assert!(financial.is_specialized);
        assert_eq!(financial.analysis_type, AnalysisType::Financial);
        assert!(!financial.critic_rules.is_empty());

        let competitors = AnalysisRouter::resolve("competitor");
        assert_eq!(competitors.analysis_type, AnalysisType::Competitors);
        assert_eq!(competitors.temperature_override, Some(0.6));

        let conversion = AnalysisRouter::resolve("Conversion");
        assert!(conversion.temperature_override.is_none());
        assert!(!conversion.collector_focus.is_empty());
    }
}

//! Aggregated store statistics handed to the Collector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderStats {
    pub total: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub revenue: f64,
    pub average_ticket: f64,
    pub previous_period_revenue: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopProduct {
    pub title: String,
    pub units_sold: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductStats {
    pub total: u64,
    pub active: u64,
    pub out_of_stock: u64,
    pub low_stock: u64,
    pub without_sales: u64,
    pub top_sellers: Vec<TopProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerStats {
    pub total: u64,
    pub new: u64,
    pub returning: u64,
    pub repeat_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponStats {
    pub active: u64,
    pub used: u64,
    pub discount_total: f64,
    pub revenue_with_coupons: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionStats {
    pub visits: u64,
    pub conversion_rate: f64,
    pub cart_abandonment_rate: f64,
}

/// Metrics for one store over one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreMetrics {
    pub orders: OrderStats,
    pub products: ProductStats,
    pub customers: CustomerStats,
    pub coupons: CouponStats,
    pub conversion: Option<ConversionStats>,
}

impl StoreMetrics {
    /// Whether the store had any order activity in the period.
    pub fn has_sales(&self) -> bool {
        self.orders.total > 0
    }

    pub fn top_seller_titles(&self, limit: usize) -> Vec<String> {
        self.products
            .top_sellers
            .iter()
            .take(limit)
            .map(|p| p.title.clone())
            .collect()
    }

    pub fn cancellation_rate(&self) -> f64 {
        if self.orders.total == 0 {
            0.0
        } else {
            self.orders.cancelled as f64 / self.orders.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let metrics: StoreMetrics =
            serde_json::from_str(r#"{"orders": {"total": 10, "cancelled": 2}}"#).unwrap();
        assert_eq!(metrics.orders.total, 10);
        assert_eq!(metrics.products.total, 0);
        assert!(metrics.conversion.is_none());
        assert!((metrics.cancellation_rate() - 0.2).abs() < f64::EPSILON);
    }
}

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AnalysisPeriod, Store, StoreMetrics};

/// Source of aggregated store statistics.
#[async_trait]
pub trait StoreMetricsProvider: Send + Sync {
    async fn collect(&self, store: &Store, period: &AnalysisPeriod) -> DomainResult<StoreMetrics>;
}

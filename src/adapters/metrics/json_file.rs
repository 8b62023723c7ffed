//! Metrics read from a JSON export on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AnalysisPeriod, Store, StoreMetrics};
use crate::domain::ports::StoreMetricsProvider;

/// Serves a pre-aggregated [`StoreMetrics`] document.
///
/// The file is read on every call so an export can be refreshed between runs.
/// Missing sections fall back to zeroed defaults.
#[derive(Debug, Clone)]
pub struct JsonFileMetricsProvider {
    path: PathBuf,
}

impl JsonFileMetricsProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl StoreMetricsProvider for JsonFileMetricsProvider {
    async fn collect(&self, store: &Store, period: &AnalysisPeriod) -> DomainResult<StoreMetrics> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::ValidationFailed(format!(
                "cannot read metrics file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let metrics: StoreMetrics = serde_json::from_str(&raw)?;

        tracing::debug!(
            store_id = %store.id,
            period_days = period.days(),
            orders = metrics.orders.total,
            "Loaded store metrics from file"
        );
        Ok(metrics)
    }
}

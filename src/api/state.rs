//! Application state for shared services

use std::sync::Arc;

use crate::domain::{Cache, HistoryRepository};
use crate::infrastructure::observability::PrometheusMetrics;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::services::MedicalQueryService;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub query_service: Arc<MedicalQueryService>,
    pub cache: Arc<dyn Cache>,
    /// `None` disables rate limiting
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub metrics: Option<PrometheusMetrics>,
}

impl AppState {
    pub fn new(query_service: Arc<MedicalQueryService>, cache: Arc<dyn Cache>) -> Self {
        Self {
            query_service,
            cache,
            rate_limiter: None,
            metrics: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_metrics(mut self, metrics: Option<PrometheusMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn history(&self) -> &Arc<dyn HistoryRepository> {
        self.query_service.history()
    }
}

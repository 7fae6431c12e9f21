//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_cache_outcome, record_http_request,
    record_llm_request, record_medical_query, record_rate_limit_rejection, PrometheusMetrics,
};

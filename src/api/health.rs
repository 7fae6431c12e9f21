//! Health, readiness and liveness endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::domain::{Cache, DomainError, HistoryRepository};

pub const SERVICE_NAME: &str = "mediverse";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Readiness report with per-component status
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub checks: Vec<HealthCheck>,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub backend: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
}

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Mediverse API",
        version: env!("CARGO_PKG_VERSION"),
        docs: "/docs",
    })
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        service: SERVICE_NAME,
        timestamp: Utc::now(),
    })
}

/// GET /ready - checks the cache and the history store
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let checks = vec![check_cache(&state).await, check_history(&state).await];

    // An unreachable cache only degrades readiness
    let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else if checks
        .iter()
        .any(|c| c.name == "history" && c.status == HealthStatus::Unhealthy)
    {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Degraded
    };

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks,
        latency_ms: start.elapsed().as_millis() as u64,
    };

    (code, Json(response))
}

/// GET /live
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_cache(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let result = state.cache.size().await;

    component_check("cache", state.cache.backend_name(), result.err(), start)
}

async fn check_history(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let history = state.history();
    let result = history.count().await;

    component_check("history", history.backend_name(), result.err(), start)
}

fn component_check(
    name: &'static str,
    backend: &'static str,
    error: Option<DomainError>,
    start: Instant,
) -> HealthCheck {
    HealthCheck {
        name,
        backend,
        status: if error.is_some() {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        },
        message: error.map(|e| e.to_string()),
        latency_ms: start.elapsed().as_millis() as u64,
    }
}

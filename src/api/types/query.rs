//! Request and response bodies of the medical endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{HistoryRecord, Source};

const HISTORY_DEFAULT_LIMIT: i64 = 10;
const HISTORY_MAX_LIMIT: i64 = 50;

fn default_mode() -> String {
    "quick".to_string()
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

/// Body of `POST /api/v1/query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_true")]
    pub include_sources: bool,
    /// Accepted for compatibility; answers follow the language of the question
    #[serde(default = "default_language")]
    pub language: String,
}

/// Query string of `GET /api/v1/history`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

impl HistoryParams {
    /// Requested limit clamped to `1..=50`
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(HISTORY_DEFAULT_LIMIT)
            .clamp(1, HISTORY_MAX_LIMIT) as usize
    }
}

/// One row of `GET /api/v1/history`
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub query: String,
    pub response_preview: String,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
    pub sources: Vec<Source>,
}

impl From<HistoryRecord> for HistoryEntry {
    fn from(record: HistoryRecord) -> Self {
        Self {
            response_preview: record.response_preview(),
            sources: record.source_list(),
            id: record.id,
            query: record.query,
            confidence_score: record.confidence_score,
            created_at: record.created_at,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::medical::QueryMode;
use crate::domain::search::Source;

/// Characters of the response kept in history listings
const PREVIEW_CHARS: usize = 200;

/// A stored question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub query: String,
    pub response: String,
    pub confidence_score: f64,
    /// JSON-encoded list of sources
    pub sources: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(
        mode: QueryMode,
        query: &str,
        response: impl Into<String>,
        confidence_score: f64,
        sources: &[Source],
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: format!("[{}] {}", mode.label(), query),
            response: response.into(),
            confidence_score,
            sources: serde_json::to_string(sources).unwrap_or_else(|_| "[]".to_string()),
            created_at: Utc::now(),
        }
    }

    /// First 200 characters of the response followed by `...`
    pub fn response_preview(&self) -> String {
        if self.response.is_empty() {
            return String::new();
        }
        let preview: String = self.response.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", preview)
    }

    /// Decoded sources; malformed rows yield an empty list
    pub fn source_list(&self) -> Vec<Source> {
        serde_json::from_str(&self.sources).unwrap_or_default()
    }
}

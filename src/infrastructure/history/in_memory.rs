//! In-memory history repository

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::history::{HistoryRecord, HistoryRepository};
use crate::domain::DomainError;

/// Process-local history used when no database is configured
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    records: RwLock<Vec<HistoryRecord>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, record: HistoryRecord) -> Result<(), DomainError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, DomainError> {
        let records = self.records.read().await;
        let mut recent: Vec<HistoryRecord> = records.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.records.read().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}

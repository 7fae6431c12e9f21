//! Query history repository trait

use async_trait::async_trait;

use super::HistoryRecord;
use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// Append-only log of answered queries
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Appends a record
    async fn append(&self, record: HistoryRecord) -> Result<(), DomainError>;

    /// Most recent records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, DomainError>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, DomainError>;

    fn backend_name(&self) -> &'static str;
}

//! PostgreSQL history repository implementation

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::history::{HistoryRecord, HistoryRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of HistoryRepository backed by `medical_queries`
#[derive(Debug, Clone)]
pub struct PostgresHistoryRepository {
    pool: PgPool,
}

impl PostgresHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool and makes sure the table exists
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        let repository = Self::new(pool);
        repository.ensure_table().await?;
        Ok(repository)
    }

    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS medical_queries (
                id UUID PRIMARY KEY,
                query TEXT NOT NULL,
                response TEXT NOT NULL,
                confidence_score DOUBLE PRECISION NOT NULL,
                sources TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS medical_queries_created_at_idx ON medical_queries (created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for PostgresHistoryRepository {
    async fn append(&self, record: HistoryRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO medical_queries (id, query, response, confidence_score, sources, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.query)
        .bind(&record.response)
        .bind(record.confidence_score)
        .bind(&record.sources)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to persist medical query: {}", e)))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, query, response, confidence_score, sources, created_at
            FROM medical_queries
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list medical queries: {}", e)))?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medical_queries")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count medical queries: {}", e)))?;

        Ok(count as usize)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn row_to_record(row: &PgRow) -> HistoryRecord {
    let sources: Option<String> = row.get("sources");

    HistoryRecord {
        id: row.get("id"),
        query: row.get("query"),
        response: row.get("response"),
        confidence_score: row.get("confidence_score"),
        sources: sources.unwrap_or_else(|| "[]".to_string()),
        created_at: row.get("created_at"),
    }
}

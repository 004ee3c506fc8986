use crate::errors::FraudResult;
use crate::models::{AuditRecord, NewAuditRecord};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

/// Append-only audit persistence. The scoring path depends only on this
/// interface; any concrete store can sit behind it.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Ensure the schema exists. Idempotent, never destructive.
    async fn init(&self) -> FraudResult<()>;

    /// Append one record, assigning its id and creation timestamp.
    /// A failure here must reach the caller; audit loss is never silent.
    async fn insert(&self, record: NewAuditRecord) -> FraudResult<i64>;

    /// The `limit` most recent records, newest first. Read-only.
    async fn list(&self, limit: i64) -> FraudResult<Vec<AuditRecord>>;
}

pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteAuditStore { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(SqliteAuditStore { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn init(&self) -> FraudResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT,
                event_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                payload TEXT NOT NULL,
                email TEXT,
                ip_address TEXT,
                amount INTEGER NOT NULL,
                currency TEXT NOT NULL,
                risk_score REAL NOT NULL,
                reason TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        info!("Audit store schema ensured");
        Ok(())
    }

    async fn insert(&self, record: NewAuditRecord) -> FraudResult<i64> {
        let result = sqlx::query(
            "INSERT INTO events (external_id, event_type, created_at, payload, email, ip_address, amount, currency, risk_score, reason)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.external_id)
        .bind(&record.event_type)
        .bind(Utc::now())
        .bind(&record.payload)
        .bind(&record.email)
        .bind(&record.ip_address)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(record.risk_score)
        .bind(&record.reason)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list(&self, limit: i64) -> FraudResult<Vec<AuditRecord>> {
        let records = sqlx::query_as::<_, AuditRecord>(
            "SELECT id, external_id, event_type, created_at, payload, email, ip_address, amount, currency, risk_score, reason
             FROM events
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

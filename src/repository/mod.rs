//! Repository layer for audit persistence.
//!
//! The orchestrator only sees [`AuditStore`]. SQLite access goes through
//! Diesel (via diesel-async's `SyncConnectionWrapper`); the in-memory store
//! backs tests and throwaway servers.

mod memory;
pub mod models;
pub mod pool;
mod sqlite;

pub use memory::MemoryAuditStore;
pub use pool::{SqliteConn, SqlitePool};
pub use sqlite::SqliteAuditStore;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::models::{AuditKind, Chatbot, ComplianceRecord, PerformanceRecord, Subscription};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("database connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} not found")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent store consumed by the orchestrator.
///
/// Implementations must be safe to share across concurrent runs.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn get_chatbot(&self, chatbot_id: &str) -> StoreResult<Option<Chatbot>>;

    async fn save_chatbot(&self, chatbot: &Chatbot) -> StoreResult<()>;

    async fn get_subscription(&self, organization_id: &str) -> StoreResult<Option<Subscription>>;

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()>;

    async fn reset_trigger_count(&self, organization_id: &str, kind: AuditKind) -> StoreResult<()>;

    /// Add one to the counter and return the new value.
    async fn increment_trigger_count(
        &self,
        organization_id: &str,
        kind: AuditKind,
    ) -> StoreResult<u32>;

    async fn find_compliance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<ComplianceRecord>>;

    /// Most recently configured compliance record for a chatbot.
    async fn latest_compliance(&self, chatbot_id: &str) -> StoreResult<Option<ComplianceRecord>>;

    async fn save_compliance(&self, record: &ComplianceRecord) -> StoreResult<()>;

    async fn find_performance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<PerformanceRecord>>;

    /// Most recently configured performance record for a chatbot.
    async fn latest_performance(&self, chatbot_id: &str)
        -> StoreResult<Option<PerformanceRecord>>;

    async fn save_performance(&self, record: &PerformanceRecord) -> StoreResult<()>;
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Fixed-width RFC 3339 so text columns sort chronologically.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

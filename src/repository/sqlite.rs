//! Diesel-backed SQLite store.

use std::path::Path;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::debug;

use super::models::{
    ChatbotRecord, ComplianceRow, PerformanceRow, SubscriptionRecord,
};
use super::pool::SqlitePool;
use super::{AuditStore, StoreError, StoreResult};
use crate::models::{AuditKind, Chatbot, ComplianceRecord, PerformanceRecord, Subscription};
use crate::schema::{chatbots, compliance_records, performance_records, subscriptions};
use crate::with_conn;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chatbots (
    chatbot_id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    organization_id TEXT PRIMARY KEY,
    subscription_tier TEXT NOT NULL DEFAULT 'Trial',
    compliance_trigger_count INTEGER NOT NULL DEFAULT 0,
    performance_trigger_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS compliance_records (
    chatbot_id TEXT NOT NULL,
    base_url TEXT NOT NULL,
    seo_score TEXT,
    passed_checks INTEGER NOT NULL DEFAULT 0,
    total_checks INTEGER NOT NULL DEFAULT 0,
    categories TEXT NOT NULL DEFAULT '[]',
    action_items TEXT NOT NULL DEFAULT '[]',
    configured_at TEXT NOT NULL,
    updated_at TEXT,
    PRIMARY KEY (chatbot_id, base_url)
);

CREATE TABLE IF NOT EXISTS performance_records (
    chatbot_id TEXT NOT NULL,
    base_url TEXT NOT NULL,
    overall_score TEXT,
    metrics TEXT,
    accessibility TEXT,
    best_practices TEXT,
    seo TEXT,
    opportunities TEXT NOT NULL DEFAULT '[]',
    diagnostics TEXT NOT NULL DEFAULT '[]',
    recommendations TEXT NOT NULL DEFAULT '[]',
    configured_at TEXT NOT NULL,
    updated_at TEXT,
    PRIMARY KEY (chatbot_id, base_url)
);

CREATE INDEX IF NOT EXISTS idx_compliance_chatbot ON compliance_records(chatbot_id, configured_at);
CREATE INDEX IF NOT EXISTS idx_performance_chatbot ON performance_records(chatbot_id, configured_at);
"#;

#[derive(Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `database_url` and create any missing tables.
    pub async fn open(database_url: &str) -> StoreResult<Self> {
        let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        if let Some(parent) = Path::new(url).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self::new(SqlitePool::new(database_url));
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> StoreResult<()> {
        with_conn!(self.pool, conn => {
            conn.batch_execute(SCHEMA).await?;
        });
        debug!("Schema ready at {}", self.pool.database_url());
        Ok(())
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn get_chatbot(&self, chatbot_id: &str) -> StoreResult<Option<Chatbot>> {
        with_conn!(self.pool, conn => {
            Ok(chatbots::table
                .find(chatbot_id)
                .select(ChatbotRecord::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(Chatbot::from))
        })
    }

    async fn save_chatbot(&self, chatbot: &Chatbot) -> StoreResult<()> {
        with_conn!(self.pool, conn => {
            diesel::replace_into(chatbots::table)
                .values((
                    chatbots::chatbot_id.eq(&chatbot.chatbot_id),
                    chatbots::organization_id.eq(&chatbot.organization_id),
                ))
                .execute(&mut conn)
                .await?;
        });
        Ok(())
    }

    async fn get_subscription(&self, organization_id: &str) -> StoreResult<Option<Subscription>> {
        with_conn!(self.pool, conn => {
            Ok(subscriptions::table
                .find(organization_id)
                .select(SubscriptionRecord::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(Subscription::from))
        })
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        with_conn!(self.pool, conn => {
            diesel::replace_into(subscriptions::table)
                .values((
                    subscriptions::organization_id.eq(&subscription.organization_id),
                    subscriptions::subscription_tier.eq(&subscription.tier),
                    subscriptions::compliance_trigger_count
                        .eq(subscription.compliance_trigger_count as i32),
                    subscriptions::performance_trigger_count
                        .eq(subscription.performance_trigger_count as i32),
                ))
                .execute(&mut conn)
                .await?;
        });
        Ok(())
    }

    async fn reset_trigger_count(&self, organization_id: &str, kind: AuditKind) -> StoreResult<()> {
        let rows = with_conn!(self.pool, conn => {
            match kind {
                AuditKind::Compliance => diesel::update(subscriptions::table.find(organization_id))
                    .set(subscriptions::compliance_trigger_count.eq(0))
                    .execute(&mut conn)
                    .await?,
                AuditKind::Performance => diesel::update(subscriptions::table.find(organization_id))
                    .set(subscriptions::performance_trigger_count.eq(0))
                    .execute(&mut conn)
                    .await?,
            }
        });
        if rows == 0 {
            return Err(StoreError::NotFound(format!("subscription {}", organization_id)));
        }
        Ok(())
    }

    async fn increment_trigger_count(
        &self,
        organization_id: &str,
        kind: AuditKind,
    ) -> StoreResult<u32> {
        let count: Option<i32> = with_conn!(self.pool, conn => {
            let rows = match kind {
                AuditKind::Compliance => diesel::update(subscriptions::table.find(organization_id))
                    .set(subscriptions::compliance_trigger_count
                        .eq(subscriptions::compliance_trigger_count + 1))
                    .execute(&mut conn)
                    .await?,
                AuditKind::Performance => diesel::update(subscriptions::table.find(organization_id))
                    .set(subscriptions::performance_trigger_count
                        .eq(subscriptions::performance_trigger_count + 1))
                    .execute(&mut conn)
                    .await?,
            };
            if rows == 0 {
                None
            } else {
                let record = subscriptions::table
                    .find(organization_id)
                    .select(SubscriptionRecord::as_select())
                    .first(&mut conn)
                    .await?;
                Some(match kind {
                    AuditKind::Compliance => record.compliance_trigger_count,
                    AuditKind::Performance => record.performance_trigger_count,
                })
            }
        });
        count
            .map(|c| c.max(0) as u32)
            .ok_or_else(|| StoreError::NotFound(format!("subscription {}", organization_id)))
    }

    async fn find_compliance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<ComplianceRecord>> {
        with_conn!(self.pool, conn => {
            Ok(compliance_records::table
                .find((chatbot_id, base_url))
                .select(ComplianceRow::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(ComplianceRecord::from))
        })
    }

    async fn latest_compliance(&self, chatbot_id: &str) -> StoreResult<Option<ComplianceRecord>> {
        with_conn!(self.pool, conn => {
            Ok(compliance_records::table
                .filter(compliance_records::chatbot_id.eq(chatbot_id))
                .order(compliance_records::configured_at.desc())
                .select(ComplianceRow::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(ComplianceRecord::from))
        })
    }

    async fn save_compliance(&self, record: &ComplianceRecord) -> StoreResult<()> {
        let row = ComplianceRow::try_from(record)?;
        with_conn!(self.pool, conn => {
            // Use replace_into for SQLite upsert
            diesel::replace_into(compliance_records::table)
                .values(&row)
                .execute(&mut conn)
                .await?;
        });
        Ok(())
    }

    async fn find_performance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<PerformanceRecord>> {
        with_conn!(self.pool, conn => {
            Ok(performance_records::table
                .find((chatbot_id, base_url))
                .select(PerformanceRow::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(PerformanceRecord::from))
        })
    }

    async fn latest_performance(
        &self,
        chatbot_id: &str,
    ) -> StoreResult<Option<PerformanceRecord>> {
        with_conn!(self.pool, conn => {
            Ok(performance_records::table
                .filter(performance_records::chatbot_id.eq(chatbot_id))
                .order(performance_records::configured_at.desc())
                .select(PerformanceRow::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(PerformanceRecord::from))
        })
    }

    async fn save_performance(&self, record: &PerformanceRecord) -> StoreResult<()> {
        let row = PerformanceRow::try_from(record)?;
        with_conn!(self.pool, conn => {
            diesel::replace_into(performance_records::table)
                .values(&row)
                .execute(&mut conn)
                .await?;
        });
        Ok(())
    }
}

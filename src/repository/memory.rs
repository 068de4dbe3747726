//! In-memory audit store for single-process operation.
//!
//! State is not persisted across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AuditStore, StoreError, StoreResult};
use crate::models::{AuditKind, Chatbot, ComplianceRecord, PerformanceRecord, Subscription};

type RecordKey = (String, String);

#[derive(Clone, Default)]
pub struct MemoryAuditStore {
    chatbots: Arc<RwLock<HashMap<String, Chatbot>>>,
    subscriptions: Arc<RwLock<HashMap<String, Subscription>>>,
    compliance: Arc<RwLock<HashMap<RecordKey, ComplianceRecord>>>,
    performance: Arc<RwLock<HashMap<RecordKey, PerformanceRecord>>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(chatbot_id: &str, base_url: &str) -> RecordKey {
    (chatbot_id.to_string(), base_url.to_string())
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn get_chatbot(&self, chatbot_id: &str) -> StoreResult<Option<Chatbot>> {
        Ok(self.chatbots.read().await.get(chatbot_id).cloned())
    }

    async fn save_chatbot(&self, chatbot: &Chatbot) -> StoreResult<()> {
        self.chatbots
            .write()
            .await
            .insert(chatbot.chatbot_id.clone(), chatbot.clone());
        Ok(())
    }

    async fn get_subscription(&self, organization_id: &str) -> StoreResult<Option<Subscription>> {
        Ok(self.subscriptions.read().await.get(organization_id).cloned())
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.subscriptions
            .write()
            .await
            .insert(subscription.organization_id.clone(), subscription.clone());
        Ok(())
    }

    async fn reset_trigger_count(&self, organization_id: &str, kind: AuditKind) -> StoreResult<()> {
        let mut subs = self.subscriptions.write().await;
        let sub = subs
            .get_mut(organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("subscription {}", organization_id)))?;
        sub.set_trigger_count(kind, 0);
        Ok(())
    }

    async fn increment_trigger_count(
        &self,
        organization_id: &str,
        kind: AuditKind,
    ) -> StoreResult<u32> {
        let mut subs = self.subscriptions.write().await;
        let sub = subs
            .get_mut(organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("subscription {}", organization_id)))?;
        let next = sub.trigger_count(kind) + 1;
        sub.set_trigger_count(kind, next);
        Ok(next)
    }

    async fn find_compliance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<ComplianceRecord>> {
        Ok(self
            .compliance
            .read()
            .await
            .get(&key(chatbot_id, base_url))
            .cloned())
    }

    async fn latest_compliance(&self, chatbot_id: &str) -> StoreResult<Option<ComplianceRecord>> {
        Ok(self
            .compliance
            .read()
            .await
            .values()
            .filter(|r| r.chatbot_id == chatbot_id)
            .max_by_key(|r| r.configured_at)
            .cloned())
    }

    async fn save_compliance(&self, record: &ComplianceRecord) -> StoreResult<()> {
        self.compliance
            .write()
            .await
            .insert(key(&record.chatbot_id, &record.base_url), record.clone());
        Ok(())
    }

    async fn find_performance(
        &self,
        chatbot_id: &str,
        base_url: &str,
    ) -> StoreResult<Option<PerformanceRecord>> {
        Ok(self
            .performance
            .read()
            .await
            .get(&key(chatbot_id, base_url))
            .cloned())
    }

    async fn latest_performance(
        &self,
        chatbot_id: &str,
    ) -> StoreResult<Option<PerformanceRecord>> {
        Ok(self
            .performance
            .read()
            .await
            .values()
            .filter(|r| r.chatbot_id == chatbot_id)
            .max_by_key(|r| r.configured_at)
            .cloned())
    }

    async fn save_performance(&self, record: &PerformanceRecord) -> StoreResult<()> {
        self.performance
            .write()
            .await
            .insert(key(&record.chatbot_id, &record.base_url), record.clone());
        Ok(())
    }
}

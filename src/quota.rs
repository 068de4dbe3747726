//! Weekly audit quota per organization and audit kind.
//!
//! Counters live on the subscription. A reservation taken here is held in
//! process until the run finishes: committed runs bump the stored counter,
//! anything else just releases the slot.
//!
//! Reads of the stored counter and commits for the same organization and
//! kind are serialized through a per-key gate, so a trigger never decides
//! on a counter another run is about to change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{AuditError, AuditResult};
use crate::models::AuditKind;
use crate::repository::{AuditStore, StoreResult};

type InflightKey = (String, AuditKind);
type Inflight = Arc<Mutex<HashMap<InflightKey, u32>>>;
type Gate = Arc<tokio::sync::Mutex<()>>;
type Gates = Arc<Mutex<HashMap<InflightKey, Gate>>>;

#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn AuditStore>,
    window: Duration,
    inflight: Inflight,
    gates: Gates,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn AuditStore>, window_days: i64) -> Self {
        Self {
            store,
            window: Duration::days(window_days.max(0)),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check the organization's subscription against its tier limit and
    /// hold a slot.
    ///
    /// The counter and the last audit time of the chatbot's latest record
    /// are read fresh under the gate. When that audit is older than the
    /// window the stored counter is reset first.
    pub async fn check_and_reserve(
        &self,
        organization_id: &str,
        chatbot_id: &str,
        kind: AuditKind,
        now: DateTime<Utc>,
    ) -> AuditResult<QuotaReservation> {
        let key = (organization_id.to_string(), kind);
        let gate = self.gate(&key);
        let _held = gate.lock().await;

        let subscription = self
            .store
            .get_subscription(organization_id)
            .await?
            .ok_or(AuditError::SubscriptionNotFound)?;
        let mut count = subscription.trigger_count(kind);

        if count > 0 {
            if let Some(last) = self.last_audited(chatbot_id, kind).await? {
                if last < now - self.window {
                    info!(
                        "Resetting {} trigger count for {} (last audit {})",
                        kind, organization_id, last
                    );
                    self.store.reset_trigger_count(organization_id, kind).await?;
                    count = 0;
                }
            }
        }

        let limit = subscription.weekly_limit();
        let mut inflight = lock(&self.inflight);
        let pending = inflight.get(&key).copied().unwrap_or(0);

        if count + pending >= limit {
            return Err(AuditError::QuotaExceeded {
                message: format!(
                    "Weekly SEO {} limit reached ({}/week for {} plan).",
                    kind,
                    limit,
                    subscription.tier_name()
                ),
            });
        }

        *inflight.entry(key).or_insert(0) += 1;
        debug!(
            "Reserved {} slot for {} ({} used, {} pending, limit {})",
            kind, organization_id, count, pending, limit
        );

        Ok(QuotaReservation {
            store: self.store.clone(),
            inflight: self.inflight.clone(),
            gate: gate.clone(),
            organization_id: organization_id.to_string(),
            kind,
            released: false,
        })
    }

    /// Reservations currently held for an organization.
    pub fn pending(&self, organization_id: &str, kind: AuditKind) -> u32 {
        lock(&self.inflight)
            .get(&(organization_id.to_string(), kind))
            .copied()
            .unwrap_or(0)
    }

    fn gate(&self, key: &InflightKey) -> Gate {
        self.gates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(key.clone())
            .or_default()
            .clone()
    }

    async fn last_audited(
        &self,
        chatbot_id: &str,
        kind: AuditKind,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(match kind {
            AuditKind::Compliance => self
                .store
                .latest_compliance(chatbot_id)
                .await?
                .and_then(|r| r.updated_at),
            AuditKind::Performance => self
                .store
                .latest_performance(chatbot_id)
                .await?
                .and_then(|r| r.updated_at),
        })
    }
}

fn lock(inflight: &Inflight) -> std::sync::MutexGuard<'_, HashMap<InflightKey, u32>> {
    inflight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A held quota slot. Dropping it without [`commit`](Self::commit) gives
/// the slot back.
pub struct QuotaReservation {
    store: Arc<dyn AuditStore>,
    inflight: Inflight,
    gate: Gate,
    organization_id: String,
    kind: AuditKind,
    released: bool,
}

impl QuotaReservation {
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn kind(&self) -> AuditKind {
        self.kind
    }

    /// Count the run against the quota. Returns the new stored counter.
    ///
    /// The increment and the slot release happen under the gate, so a
    /// concurrent check sees either the pending slot or the new count.
    pub async fn commit(mut self) -> StoreResult<u32> {
        let gate = self.gate.clone();
        let _held = gate.lock().await;
        let result = self
            .store
            .increment_trigger_count(&self.organization_id, self.kind)
            .await;
        self.release();
        result
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let mut inflight = lock(&self.inflight);
        let key = (self.organization_id.clone(), self.kind);
        if let Some(n) = inflight.get_mut(&key) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                inflight.remove(&key);
            }
        }
    }
}

impl Drop for QuotaReservation {
    fn drop(&mut self) {
        self.release();
    }
}

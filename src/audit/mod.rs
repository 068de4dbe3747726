//! Per-page auditors and their site-wide aggregators.
//!
//! Both audit kinds share one run shape (discover, fan out, aggregate,
//! persist), expressed by [`AuditPipeline`].

pub mod compliance;
pub mod performance;

pub use compliance::ComplianceAuditor;
pub use performance::PerformanceAuditor;

use std::sync::Arc;

use async_trait::async_trait;

use crate::browser::BrowserSession;
use crate::error::PageAuditError;
use crate::models::AuditKind;
use crate::repository::{AuditStore, StoreError};

#[async_trait]
pub trait AuditPipeline: Send + Sync + 'static {
    /// Transient per-page result.
    type Page: Send + 'static;
    type Summary: Send + 'static;

    fn kind(&self) -> AuditKind;

    /// Simultaneous page audits for this kind.
    fn concurrency(&self) -> usize;

    /// Seconds per page used for the started-event estimate.
    fn seconds_per_page(&self) -> u64;

    async fn audit_page(
        &self,
        session: Arc<dyn BrowserSession>,
        url: String,
    ) -> Result<Self::Page, PageAuditError>;

    /// `None` when `pages` is empty.
    fn summarize(&self, pages: &[Self::Page]) -> Option<Self::Summary>;

    /// Apply the summary to the stored record and return the record as JSON.
    async fn persist(
        &self,
        store: &dyn AuditStore,
        chatbot_id: &str,
        base_url: &str,
        summary: Self::Summary,
    ) -> Result<serde_json::Value, StoreError>;
}

//! Runtime performance auditing through an external grading service.

mod pagespeed;
mod summary;

pub use pagespeed::{normalize, GraderError, PageSpeedClient, PerformanceGrader, CATEGORIES};
pub use summary::build_summary;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::AuditPipeline;
use crate::browser::BrowserSession;
use crate::config::PerformanceConfig;
use crate::error::PageAuditError;
use crate::models::{AuditKind, PagePerformance, PerformanceRecord, PerformanceSummary};
use crate::repository::{AuditStore, StoreError};

/// Grades each discovered page; the browser is only used for discovery.
pub struct PerformanceAuditor {
    config: PerformanceConfig,
    grader: Arc<dyn PerformanceGrader>,
}

impl PerformanceAuditor {
    pub fn new(config: PerformanceConfig, grader: Arc<dyn PerformanceGrader>) -> Self {
        Self { config, grader }
    }

    pub fn from_config(config: PerformanceConfig) -> Result<Self, reqwest::Error> {
        if config.api_key.is_none() {
            warn!("No PageSpeed API key configured; requests will be heavily rate limited");
        }
        let grader = PageSpeedClient::new(&config)?;
        Ok(Self::new(config, Arc::new(grader)))
    }
}

#[async_trait]
impl AuditPipeline for PerformanceAuditor {
    type Page = PagePerformance;
    type Summary = PerformanceSummary;

    fn kind(&self) -> AuditKind {
        AuditKind::Performance
    }

    fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    fn seconds_per_page(&self) -> u64 {
        self.config.seconds_per_page
    }

    async fn audit_page(
        &self,
        _session: Arc<dyn BrowserSession>,
        url: String,
    ) -> Result<PagePerformance, PageAuditError> {
        let payload = self
            .grader
            .grade(&url)
            .await
            .map_err(|e| PageAuditError::ExternalService(e.to_string()))?;
        let page = normalize(&url, &payload)
            .map_err(|e| PageAuditError::ExternalService(e.to_string()))?;
        info!("Performance audit completed for {}", url);
        Ok(page)
    }

    fn summarize(&self, pages: &[PagePerformance]) -> Option<PerformanceSummary> {
        build_summary(pages)
    }

    async fn persist(
        &self,
        store: &dyn AuditStore,
        chatbot_id: &str,
        base_url: &str,
        summary: PerformanceSummary,
    ) -> Result<serde_json::Value, StoreError> {
        let mut record = store
            .find_performance(chatbot_id, base_url)
            .await?
            .unwrap_or_else(|| PerformanceRecord::new(chatbot_id, base_url));
        record.apply(summary, chrono::Utc::now());
        store.save_performance(&record).await?;
        Ok(serde_json::to_value(&record)?)
    }
}

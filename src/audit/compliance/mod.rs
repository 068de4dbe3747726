//! On-page SEO compliance auditing.

mod extract;
mod probe;
mod summary;

pub use extract::{DomSignalExtractor, SignalExtractor};
pub use probe::{HttpOriginProbe, OriginProbe};
pub use summary::{build_summary, total_checks};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::AuditPipeline;
use crate::browser::{BrowserError, BrowserPage, BrowserSession, PageProfile, ANCHORS_PRESENT};
use crate::config::ComplianceConfig;
use crate::error::PageAuditError;
use crate::models::{AuditKind, ComplianceRecord, ComplianceSummary, PageSignals};
use crate::repository::{AuditStore, StoreError};

/// Hydration predicate: a title, meta description, or canonical link exists.
const METADATA_PRESENT: &str = "(!!document.title && document.title.trim().length > 0) \
    || !!document.querySelector('meta[name=\"description\"]') \
    || !!document.querySelector('link[rel=\"canonical\"]')";

/// Renders each page fully and extracts compliance signals.
pub struct ComplianceAuditor {
    config: ComplianceConfig,
    extractor: Arc<dyn SignalExtractor>,
    probe: Arc<dyn OriginProbe>,
}

impl ComplianceAuditor {
    pub fn new(
        config: ComplianceConfig,
        extractor: Arc<dyn SignalExtractor>,
        probe: Arc<dyn OriginProbe>,
    ) -> Self {
        Self {
            config,
            extractor,
            probe,
        }
    }

    /// DOM extractor plus HTTP probes.
    pub fn from_config(config: ComplianceConfig) -> Result<Self, reqwest::Error> {
        let probe = HttpOriginProbe::new(Duration::from_secs(config.probe_timeout))?;
        Ok(Self::new(config, Arc::new(DomSignalExtractor), Arc::new(probe)))
    }

    async fn render(
        &self,
        page: &dyn BrowserPage,
        url: &str,
    ) -> Result<(String, Url), BrowserError> {
        page.goto(url, Duration::from_secs(self.config.navigation_timeout))
            .await?;

        if !page
            .wait_for(METADATA_PRESENT, Duration::from_secs(self.config.metadata_wait))
            .await
        {
            debug!(
                "No title/description/canonical on {} after {}s",
                url, self.config.metadata_wait
            );
        }
        if !page
            .wait_for(ANCHORS_PRESENT, Duration::from_secs(self.config.link_wait))
            .await
        {
            debug!("No anchors on {} after {}s", url, self.config.link_wait);
        }

        let html = page.content().await?;
        let final_url = page
            .url()
            .await
            .ok()
            .and_then(|u| Url::parse(&u).ok())
            .or_else(|| Url::parse(url).ok())
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                reason: "unparseable page URL".to_string(),
            })?;
        Ok((html, final_url))
    }
}

#[async_trait]
impl AuditPipeline for ComplianceAuditor {
    type Page = PageSignals;
    type Summary = ComplianceSummary;

    fn kind(&self) -> AuditKind {
        AuditKind::Compliance
    }

    fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    fn seconds_per_page(&self) -> u64 {
        self.config.seconds_per_page
    }

    async fn audit_page(
        &self,
        session: Arc<dyn BrowserSession>,
        url: String,
    ) -> Result<PageSignals, PageAuditError> {
        let page = session.open_page(PageProfile::full_render()).await?;

        // Close the page before surfacing any render error
        let rendered = self.render(page.as_ref(), &url).await;
        page.close().await;
        let (html, final_url) = rendered?;

        let mut signals = self.extractor.extract(&html, &final_url);
        let (robots, sitemap) = tokio::join!(
            self.probe.found(&final_url, "/robots.txt"),
            self.probe.found(&final_url, "/sitemap.xml"),
        );
        signals.robots_txt_found = robots;
        signals.sitemap_found = sitemap;
        signals.url = url;

        info!("Compliance audit completed for {}", signals.url);
        Ok(signals)
    }

    fn summarize(&self, pages: &[PageSignals]) -> Option<ComplianceSummary> {
        build_summary(pages)
    }

    async fn persist(
        &self,
        store: &dyn AuditStore,
        chatbot_id: &str,
        base_url: &str,
        summary: ComplianceSummary,
    ) -> Result<serde_json::Value, StoreError> {
        let mut record = store
            .find_compliance(chatbot_id, base_url)
            .await?
            .unwrap_or_else(|| ComplianceRecord::new(chatbot_id, base_url));
        record.apply(summary, chrono::Utc::now());
        store.save_compliance(&record).await?;
        Ok(serde_json::to_value(&record)?)
    }
}

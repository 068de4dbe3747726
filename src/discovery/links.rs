//! Same-origin link extraction from a rendered base page.

use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{BrowserError, BrowserPage, BrowserSession, PageProfile, ANCHORS_PRESENT};
use crate::config::DiscoveryConfig;

/// Loads a site's base URL once and collects its internal links.
pub struct LinkDiscoverer {
    config: DiscoveryConfig,
}

impl LinkDiscoverer {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Discover internal links in DOM order.
    ///
    /// An anchor wait that expires is not an error; extraction proceeds
    /// with whatever the page holds.
    pub async fn discover(
        &self,
        session: &Arc<dyn BrowserSession>,
        base_url: &str,
    ) -> Result<Vec<String>, BrowserError> {
        let base = Url::parse(base_url).map_err(|e| BrowserError::Navigation {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let profile = PageProfile {
            block_resources: self.config.block_resources,
        };
        let page = session.open_page(profile).await?;

        // Close the page before surfacing any navigation error
        let result = self.collect(page.as_ref(), &base).await;
        page.close().await;

        let links = result?;
        info!("Discovered {} internal links on {}", links.len(), base_url);
        Ok(links)
    }

    async fn collect(
        &self,
        page: &dyn BrowserPage,
        base: &Url,
    ) -> Result<Vec<String>, BrowserError> {
        page.goto(base.as_str(), self.config.navigation_timeout())
            .await?;

        if !page.wait_for(ANCHORS_PRESENT, self.config.link_wait()).await {
            warn!(
                "No anchors appeared on {} within {}s, extracting anyway",
                base, self.config.link_wait
            );
        }

        let html = page.content().await?;
        let page_url = page
            .url()
            .await
            .ok()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| base.clone());

        Ok(extract_internal_links(&html, &page_url, base))
    }
}

/// Resolve every `a[href]` against `page_url` and keep the http(s) links
/// sharing `base`'s origin, fragment-stripped and de-duplicated.
pub fn extract_internal_links(html: &str, page_url: &Url, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }

        let mut url = match page_url.join(href) {
            Ok(u) => u,
            Err(e) => {
                debug!("Skipping unparseable href {:?}: {}", href, e);
                continue;
            }
        };

        if !matches!(url.scheme(), "http" | "https") || !same_origin(&url, base) {
            continue;
        }

        url.set_fragment(None);
        let link = url.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

/// True when both URLs share scheme, host, and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

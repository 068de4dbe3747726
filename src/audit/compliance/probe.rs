//! Site-level robots.txt / sitemap.xml presence probes.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::DEFAULT_USER_AGENT;

/// Probes well-known files on a page's origin.
#[async_trait]
pub trait OriginProbe: Send + Sync {
    /// HTTP status of a GET to `path` on `page_url`'s origin, or `None`
    /// when the request never completed.
    async fn status(&self, page_url: &Url, path: &str) -> Option<u16>;

    /// Present only on a plain 200.
    async fn found(&self, page_url: &Url, path: &str) -> bool {
        self.status(page_url, path).await == Some(200)
    }
}

/// reqwest-backed probe.
pub struct HttpOriginProbe {
    client: reqwest::Client,
}

impl HttpOriginProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl OriginProbe for HttpOriginProbe {
    async fn status(&self, page_url: &Url, path: &str) -> Option<u16> {
        let target = page_url.join(path).ok()?;
        match self.client.get(target.as_str()).send().await {
            Ok(resp) => Some(resp.status().as_u16()),
            Err(e) => {
                debug!("Probe of {} failed: {}", target, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Option<u16>);

    #[async_trait]
    impl OriginProbe for FixedProbe {
        async fn status(&self, _page_url: &Url, _path: &str) -> Option<u16> {
            self.0
        }
    }

    #[tokio::test]
    async fn test_found_only_on_200() {
        let url = Url::parse("https://example.com/deep/page").unwrap();
        assert!(FixedProbe(Some(200)).found(&url, "/robots.txt").await);
        assert!(!FixedProbe(Some(204)).found(&url, "/robots.txt").await);
        assert!(!FixedProbe(Some(404)).found(&url, "/robots.txt").await);
        assert!(!FixedProbe(None).found(&url, "/robots.txt").await);
    }

    #[test]
    fn test_probe_path_is_origin_relative() {
        let url = Url::parse("https://example.com/deep/page?q=1").unwrap();
        assert_eq!(
            url.join("/sitemap.xml").unwrap().as_str(),
            "https://example.com/sitemap.xml"
        );
    }
}

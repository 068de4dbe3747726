//! Per-stage audit settings: discovery, compliance, performance, quota.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// PageSpeed Insights v5 endpoint.
pub const PAGESPEED_API_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Seconds allowed for loading the base URL.
    #[serde(default = "default_discovery_navigation")]
    pub navigation_timeout: u64,
    /// Seconds to wait for the first anchor to appear.
    #[serde(default = "default_discovery_link_wait")]
    pub link_wait: u64,
    /// Block images, stylesheets, and fonts while discovering.
    #[serde(default = "default_true")]
    pub block_resources: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: default_discovery_navigation(),
            link_wait: default_discovery_link_wait(),
            block_resources: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }

    pub fn link_wait(&self) -> Duration {
        Duration::from_secs(self.link_wait)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Simultaneous page audits.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_compliance_navigation")]
    pub navigation_timeout: u64,
    /// Seconds to wait for a title, description, or canonical tag.
    #[serde(default = "default_metadata_wait")]
    pub metadata_wait: u64,
    #[serde(default = "default_compliance_link_wait")]
    pub link_wait: u64,
    /// Seconds allowed for each robots.txt / sitemap.xml probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,
    /// Estimate reported in the started event.
    #[serde(default = "default_compliance_seconds_per_page")]
    pub seconds_per_page: u64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            navigation_timeout: default_compliance_navigation(),
            metadata_wait: default_metadata_wait(),
            link_wait: default_compliance_link_wait(),
            probe_timeout: default_probe_timeout(),
            seconds_per_page: default_compliance_seconds_per_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API key for the grading service. Falls back to `PAGESPEED_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_performance_seconds_per_page")]
    pub seconds_per_page: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            api_url: default_api_url(),
            api_key: None,
            request_timeout: default_request_timeout(),
            seconds_per_page: default_performance_seconds_per_page(),
        }
    }
}

impl PerformanceConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var("PAGESPEED_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Rolling window after which trigger counts reset.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    1
}

fn default_discovery_navigation() -> u64 {
    120
}

fn default_discovery_link_wait() -> u64 {
    7
}

fn default_compliance_navigation() -> u64 {
    60
}

fn default_metadata_wait() -> u64 {
    7
}

fn default_compliance_link_wait() -> u64 {
    4
}

fn default_probe_timeout() -> u64 {
    15
}

fn default_compliance_seconds_per_page() -> u64 {
    25
}

fn default_api_url() -> String {
    PAGESPEED_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_performance_seconds_per_page() -> u64 {
    30
}

fn default_window_days() -> i64 {
    7
}

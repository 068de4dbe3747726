//! Rendering browser abstraction.
//!
//! Orchestration only sees the [`BrowserLauncher`] / [`BrowserSession`] /
//! [`BrowserPage`] traits. The chromiumoxide (CDP) backend with stealth
//! evasion lives in [`chromium`]; tests inject their own doubles.

mod chromium;
mod stealth;

pub use chromium::ChromiumLauncher;
pub use stealth::{extra_headers, BLOCKED_RESOURCE_PATTERNS, STEALTH_SCRIPTS};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Predicate satisfied once the DOM holds at least one navigable anchor.
pub const ANCHORS_PRESENT: &str = "document.querySelectorAll('a[href]').length > 0";

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("navigation to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
    #[error("page error: {0}")]
    Page(String),
}

/// Per-page session setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageProfile {
    /// Abort image, stylesheet, and font requests.
    pub block_resources: bool,
}

impl PageProfile {
    pub fn lightweight() -> Self {
        Self {
            block_resources: true,
        }
    }

    pub fn full_render() -> Self {
        Self {
            block_resources: false,
        }
    }
}

/// Starts the top-level browser process for one run.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError>;
}

/// A running browser. Every page opened from it is an isolated context.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn open_page(&self, profile: PageProfile) -> Result<Box<dyn BrowserPage>, BrowserError>;

    /// Tear down the browser process. Safe to call more than once.
    async fn shutdown(&self);
}

/// One open tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Poll a JavaScript predicate until it holds. Returns `false` on timeout;
    /// expiry is never an error.
    async fn wait_for(&self, predicate: &str, timeout: Duration) -> bool;

    /// Final URL after redirects.
    async fn url(&self) -> Result<String, BrowserError>;

    /// Serialized rendered DOM.
    async fn content(&self) -> Result<String, BrowserError>;

    async fn close(self: Box<Self>);
}

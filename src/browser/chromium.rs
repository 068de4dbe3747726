//! chromiumoxide-backed browser sessions.

use super::{BrowserError, BrowserLauncher, BrowserSession};
#[cfg(feature = "browser")]
use super::{BrowserPage, PageProfile};
use crate::config::BrowserEngineConfig;

#[cfg(feature = "browser")]
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

#[cfg(feature = "browser")]
use super::stealth::{extra_headers, BLOCKED_RESOURCE_PATTERNS, STEALTH_SCRIPTS};

/// Launches one Chromium process (or attaches to a remote one) per run.
pub struct ChromiumLauncher {
    config: BrowserEngineConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "browser")]
impl ChromiumLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    const CHROME_COMMANDS: &'static [&'static str] = &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ];

    fn find_chrome(&self) -> Result<PathBuf, BrowserError> {
        if let Some(ref path) = self.config.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            warn!("Configured chrome_path {} does not exist", path.display());
        }

        for path in Self::CHROME_PATHS {
            let p = Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in Self::CHROME_COMMANDS {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(BrowserError::Launch(
            "Chrome/Chromium not found. Install it or set CHROME_PATH".to_string(),
        ))
    }

    async fn launch_local(&self) -> Result<ChromiumSession, BrowserError> {
        let chrome_path = self.find_chrome()?;
        info!(
            "Launching browser {} (headless={})",
            chrome_path.display(),
            self.config.headless
        );

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.launch_timeout))
            .launch_timeout(Duration::from_secs(self.config.launch_timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-web-security")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--window-size=1280,800");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(ChromiumSession::new(browser, handler, self.config.clone(), false))
    }

    async fn connect_remote(&self, url: &str) -> Result<ChromiumSession, BrowserError> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("remote browser unreachable: {}", e)))?
            .json()
            .await
            .map_err(|e| BrowserError::Launch(format!("bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Launch("no webSocketDebuggerUrl in response".into()))?;

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.launch_timeout),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(ChromiumSession::new(browser, handler, self.config.clone(), true))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        let session = match self.config.remote_url.clone() {
            Some(remote) => self.connect_remote(&remote).await?,
            None => self.launch_local().await?,
        };
        Ok(Arc::new(session))
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        let _ = &self.config;
        Err(BrowserError::Launch(
            "Browser support not compiled. Rebuild with: cargo build --features browser".into(),
        ))
    }
}

#[cfg(feature = "browser")]
struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
    config: BrowserEngineConfig,
    remote: bool,
}

#[cfg(feature = "browser")]
impl ChromiumSession {
    fn new(
        browser: Browser,
        handler: JoinHandle<()>,
        config: BrowserEngineConfig,
        remote: bool,
    ) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
            handler,
            config,
            remote,
        }
    }

    async fn prepare(&self, page: &Page, profile: PageProfile) -> Result<(), BrowserError> {
        page.execute(SetUserAgentOverrideParams::new(self.config.user_agent.clone()))
            .await
            .map_err(page_error)?;

        if profile.block_resources || self.config.is_stealth() {
            page.execute(EnableParams::default())
                .await
                .map_err(page_error)?;
        }

        if self.config.is_stealth() {
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(extra_headers())))
                .await
                .map_err(page_error)?;
            for script in STEALTH_SCRIPTS {
                page.execute(AddScriptToEvaluateOnNewDocumentParams::new(*script))
                    .await
                    .map_err(page_error)?;
            }
        }

        if profile.block_resources {
            let patterns = BLOCKED_RESOURCE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>();
            page.execute(SetBlockedUrLsParams::new(patterns))
                .await
                .map_err(page_error)?;
        }

        Ok(())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open_page(&self, profile: PageProfile) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let page = {
            let guard = self.browser.lock().await;
            let browser = guard
                .as_ref()
                .ok_or_else(|| BrowserError::Page("browser already shut down".into()))?;
            browser.new_page("about:blank").await.map_err(page_error)?
        };

        if let Err(e) = self.prepare(&page, profile).await {
            let _ = page.close().await;
            return Err(e);
        }

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return;
        };
        if !self.remote {
            if let Err(e) = browser.close().await {
                debug!("Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        info!("Browser shut down");
    }
}

#[cfg(feature = "browser")]
struct ChromiumPage {
    page: Page,
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e,
            })?;

        let navigate = async {
            self.page.execute(nav_params).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(timeout, navigate).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }

    async fn wait_for(&self, predicate: &str, timeout: Duration) -> bool {
        let poll = async {
            loop {
                let holds = match self.page.evaluate(predicate.to_string()).await {
                    Ok(result) => result.into_value::<bool>().unwrap_or(false),
                    Err(e) => {
                        debug!("Predicate evaluation failed: {}", e);
                        false
                    }
                };
                if holds {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }

    async fn url(&self) -> Result<String, BrowserError> {
        Ok(self
            .page
            .url()
            .await
            .map_err(page_error)?
            .unwrap_or_default())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(page_error)
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.page.close().await {
            debug!("Page close failed: {}", e);
        }
    }
}

#[cfg(feature = "browser")]
fn page_error(e: chromiumoxide::error::CdpError) -> BrowserError {
    BrowserError::Page(e.to_string())
}

//! Browser engine configuration types.
//!
//! These types live here (always compiled) rather than behind
//! `#[cfg(feature = "browser")]` so that config parsing and serialization
//! work without the browser feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Realistic desktop Chrome user agent sent by every page session.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser engine types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEngineType {
    /// Chromium with fingerprint patches and realistic headers (default).
    #[default]
    Stealth,

    /// No stealth patches (for debugging).
    Standard,
}

impl BrowserEngineType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stealth" => Some(Self::Stealth),
            "standard" => Some(Self::Standard),
            _ => None,
        }
    }
}

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Browser engine type.
    #[serde(default)]
    pub engine: BrowserEngineType,

    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit Chrome/Chromium executable. Auto-detected when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// User agent override.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds allowed for launching and for each CDP request.
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout: u64,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngineType::default(),
            headless: default_headless(),
            chrome_path: None,
            proxy: None,
            chrome_args: Vec::new(),
            remote_url: None,
            user_agent: default_user_agent(),
            launch_timeout: default_launch_timeout(),
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `BROWSER_ENGINE` - stealth or standard
    /// - `CHROME_PATH` - Chrome executable
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.is_empty() {
                self.remote_url = Some(val);
            }
        }

        if let Ok(val) = std::env::var("BROWSER_ENGINE") {
            if let Some(engine) = BrowserEngineType::from_str(&val) {
                self.engine = engine;
            }
        }

        if let Ok(val) = std::env::var("CHROME_PATH") {
            if !val.is_empty() {
                self.chrome_path = Some(PathBuf::from(val));
            }
        }

        self
    }

    pub fn is_stealth(&self) -> bool {
        self.engine == BrowserEngineType::Stealth
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

pub fn default_launch_timeout() -> u64 {
    120
}

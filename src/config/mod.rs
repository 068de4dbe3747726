//! Configuration management using the prefer crate for file discovery.

mod audit;
pub mod browser;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use audit::{
    ComplianceConfig, DiscoveryConfig, PerformanceConfig, QuotaConfig, PAGESPEED_API_URL,
};
pub use browser::{BrowserEngineConfig, BrowserEngineType, DEFAULT_USER_AGENT};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "siteaudit.db";

/// Default listen address for `serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:3040";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database path or `sqlite:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Listen address for the HTTP server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration, auto-discovering `siteaudit.{toml,yaml,json,...}`.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("siteaudit").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}; using defaults", e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => {
                // No config file found, use defaults with env overrides
                Self::default_with_env()
            }
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database = Some(url);
            }
        }
        self.browser = self.browser.with_env_overrides();
        self.performance = self.performance.with_env_overrides();
        self
    }

    /// Resolve the SQLite database location.
    ///
    /// Relative paths are resolved against the config file's directory.
    pub fn database_url(&self) -> String {
        match &self.database {
            Some(db) if db.starts_with("sqlite:") || Path::new(db).is_absolute() => db.clone(),
            Some(db) => match self.base_dir() {
                Some(base) => base.join(db).display().to_string(),
                None => db.clone(),
            },
            None => default_data_dir()
                .join(DEFAULT_DATABASE_FILENAME)
                .display()
                .to_string(),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn bind_address(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }
}

/// Platform data directory, falling back to the working directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("siteaudit"))
        .unwrap_or_else(|| PathBuf::from("."))
}

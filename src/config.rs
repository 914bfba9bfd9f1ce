use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use crate::api::client::{DEFAULT_BASE_URL, DEFAULT_WHALE_FEED_LIMIT};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_trending_limit")]
    pub trending_limit: u32,
    #[serde(default = "default_whale_feed_limit")]
    pub whale_feed_limit: u32,
    #[serde(default = "default_error_display_secs")]
    pub error_display_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_database_path() -> String { "polyintel.db".to_string() }
fn default_trending_limit() -> u32 { 8 }
fn default_whale_feed_limit() -> u32 { DEFAULT_WHALE_FEED_LIMIT }
fn default_error_display_secs() -> u64 { 5 }
fn default_csv_log_path() -> String { "signals.csv".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            trending_limit: default_trending_limit(),
            whale_feed_limit: default_whale_feed_limit(),
            error_display_secs: default_error_display_secs(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_log_path(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub api_url: Option<String>,
    pub api_timeout_ms: Option<u64>,
}

impl Config {
    /// Load from `path`; a missing file means all defaults
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_timeout_ms = match std::env::var("POLYINTEL_API_TIMEOUT_MS") {
            Ok(raw) => Some(
                raw.parse()
                    .with_context(|| format!("POLYINTEL_API_TIMEOUT_MS is not a number: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            api_url: std::env::var("POLYINTEL_API_URL").ok().filter(|url| !url.is_empty()),
            api_timeout_ms,
        })
    }
}

/// Backend URL: stored override, then environment, then config file
pub fn resolve_base_url(stored_override: Option<&str>, env: &EnvConfig, config: &Config) -> String {
    stored_override
        .or(env.api_url.as_deref())
        .unwrap_or(config.api.base_url.as_str())
        .to_string()
}

pub fn resolve_timeout(env: &EnvConfig, config: &Config) -> Duration {
    Duration::from_millis(env.api_timeout_ms.unwrap_or(config.api.timeout_ms))
}

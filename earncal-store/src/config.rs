//! Configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use earncal_fetch::{FetchSettings, BROWSER_USER_AGENT};
use earncal_providers::yahoo::{DEFAULT_REGION, MAX_PAGE_SIZE};
use earncal_providers::{EarningsFetcher, YahooEndpoints};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Yahoo Finance settings.
    #[serde(default)]
    pub yahoo: YahooConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when neither `--verbose` nor `RUST_LOG` is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Yahoo Finance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YahooConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Browser User-Agent sent on every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Region filter value.
    #[serde(default = "default_region")]
    pub region: String,
    /// Rows requested per query.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pause between dates in a range fetch.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Endpoint overrides, mostly for testing against a local server.
    #[serde(default, skip_serializing_if = "EndpointOverrides::is_empty")]
    pub endpoints: EndpointOverrides,
}

/// Optional endpoint URL overrides.
///
/// `base_url` rebases every endpoint onto one host; the individual fields
/// then override single endpoints on top of that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointOverrides {
    /// Host that serves every endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Cookie issuance endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_url: Option<String>,
    /// Crumb endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crumb_url: Option<String>,
    /// Earnings calendar page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_url: Option<String>,
    /// Visualization query endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_url: Option<String>,
    /// Host that relative crumb URLs resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_host: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_request_delay_ms() -> u64 {
    1000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            region: default_region(),
            page_size: default_page_size(),
            request_delay_ms: default_request_delay_ms(),
            endpoints: EndpointOverrides::default(),
        }
    }
}

impl EndpointOverrides {
    /// Returns true if nothing is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the overrides to the production endpoints.
    pub fn apply(&self) -> YahooEndpoints {
        let mut endpoints = self
            .base_url
            .as_deref()
            .map_or_else(YahooEndpoints::default, YahooEndpoints::with_base);

        let fields = [
            (&self.cookie_url, &mut endpoints.cookie_url),
            (&self.crumb_url, &mut endpoints.crumb_url),
            (&self.calendar_url, &mut endpoints.calendar_url),
            (&self.visualization_url, &mut endpoints.visualization_url),
            (&self.query_host, &mut endpoints.query_host),
        ];
        for (value, target) in fields {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        endpoints
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("earncal")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path())
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks values that would otherwise fail deep inside a fetch.
    pub fn validate(&self) -> Result<(), StoreError> {
        let yahoo = &self.yahoo;
        if yahoo.timeout_secs == 0 {
            return Err(StoreError::Config("yahoo.timeout_secs must be positive".to_string()));
        }
        if yahoo.page_size == 0 || yahoo.page_size > MAX_PAGE_SIZE {
            return Err(StoreError::Config(format!(
                "yahoo.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if yahoo.region.trim().is_empty() {
            return Err(StoreError::Config("yahoo.region must not be empty".to_string()));
        }
        if yahoo.user_agent.trim().is_empty() {
            return Err(StoreError::Config("yahoo.user_agent must not be empty".to_string()));
        }
        Ok(())
    }

    /// Returns HTTP settings for a fetch context.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings::default()
            .with_timeout(Duration::from_secs(self.yahoo.timeout_secs))
            .with_user_agent(self.yahoo.user_agent.clone())
    }

    /// Returns the effective endpoints.
    pub fn endpoints(&self) -> YahooEndpoints {
        self.yahoo.endpoints.apply()
    }

    /// Builds a fetcher from the validated configuration.
    pub fn fetcher(&self) -> Result<EarningsFetcher, StoreError> {
        self.validate()?;
        Ok(EarningsFetcher::new()
            .with_endpoints(self.endpoints())
            .with_settings(self.fetch_settings())
            .with_region(self.yahoo.region.clone())
            .with_page_size(self.yahoo.page_size)
            .with_request_delay(Duration::from_millis(self.yahoo.request_delay_ms)))
    }
}

// ============================================================================
// Tests
// ============================================================================

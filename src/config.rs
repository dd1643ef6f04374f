//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.datapipe.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".datapipe.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Origin source settings.
    #[serde(default)]
    pub origin: OriginConfig,

    /// Object store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Notification channel settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Where and how the two datasets are fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// URL of the raw time-series file.
    #[serde(default = "default_time_series_url")]
    pub time_series_url: String,

    /// URL of the population JSON endpoint.
    #[serde(default = "default_population_url")]
    pub population_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent to origins. The BLS host rejects requests
    /// without a contact in the user agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            time_series_url: default_time_series_url(),
            population_url: default_population_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_time_series_url() -> String {
    "https://download.bls.gov/pub/time.series/pr/pr.data.0.Current".to_string()
}

fn default_population_url() -> String {
    "https://datausa.io/api/data?drilldowns=Nation&measures=Population".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("datapipe/{} (data-sync)", env!("CARGO_PKG_VERSION"))
}

/// Object store location and keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the local object store.
    #[serde(default = "default_store_root")]
    pub root: String,

    /// Key of the raw time-series blob.
    #[serde(default = "default_time_series_key")]
    pub time_series_key: String,

    /// Key of the population JSON blob.
    #[serde(default = "default_population_key")]
    pub population_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            time_series_key: default_time_series_key(),
            population_key: default_population_key(),
        }
    }
}

fn default_store_root() -> String {
    "./data".to_string()
}

fn default_time_series_key() -> String {
    "bls/pr.data.0.Current".to_string()
}

fn default_population_key() -> String {
    "population/us_population.json".to_string()
}

/// Notification channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook receiving population update messages. Messages go to the log
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Parameters of the three derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// First year (inclusive) of the population statistics window.
    #[serde(default = "default_window_start")]
    pub window_start: i32,

    /// Last year (inclusive) of the population statistics window.
    #[serde(default = "default_window_end")]
    pub window_end: i32,

    /// Series included in the combined report.
    #[serde(default = "default_report_series_id")]
    pub report_series_id: String,

    /// Period included in the combined report.
    #[serde(default = "default_report_period")]
    pub report_period: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_start: default_window_start(),
            window_end: default_window_end(),
            report_series_id: default_report_series_id(),
            report_period: default_report_period(),
        }
    }
}

fn default_window_start() -> i32 {
    2013
}

fn default_window_end() -> i32 {
    2018
}

fn default_report_series_id() -> String {
    "PRS30006032".to_string()
}

fn default_report_period() -> String {
    "Q01".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or through their
    /// environment variables) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.time_series_url {
            self.origin.time_series_url = url.clone();
        }
        if let Some(ref url) = args.population_url {
            self.origin.population_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.origin.timeout_seconds = timeout;
        }
        if let Some(ref root) = args.store_root {
            self.store.root = root.display().to_string();
        }
        if let Some(ref url) = args.notify_url {
            self.notify.webhook_url = Some(url.clone());
        }
    }

    /// Check values that would only fail later, mid-invocation.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("origin.time_series_url", &self.origin.time_series_url),
            ("origin.population_url", &self.origin.population_url),
        ] {
            if !is_http_url(url) {
                bail!("{} must start with 'http://' or 'https://'", name);
            }
        }

        if let Some(ref url) = self.notify.webhook_url {
            if !is_http_url(url) {
                bail!("notify.webhook_url must start with 'http://' or 'https://'");
            }
        }

        if self.origin.timeout_seconds == 0 {
            bail!("origin.timeout_seconds must be at least 1");
        }

        if self.analysis.window_start > self.analysis.window_end {
            bail!(
                "analysis window is inverted: {} > {}",
                self.analysis.window_start,
                self.analysis.window_end
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

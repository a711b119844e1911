//! Configuration types for poly-odds

use crate::resample::ResampleError;
use crate::transport::RetryPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Market API endpoints and pagination
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Markets listing endpoint path
    #[serde(default = "default_markets_path")]
    pub markets_path: String,

    /// History endpoint template (uses `{market_id}`)
    #[serde(default = "default_history_path_template")]
    pub history_path_template: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size for listing and history requests
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum listing pages to walk (0 = all)
    #[serde(default)]
    pub listing_max_pages: u32,

    /// Circuit breaker on history pages per market
    #[serde(default = "default_history_max_pages")]
    pub history_max_pages: u32,

    /// Only fetch resolved/closed markets
    #[serde(default = "default_true")]
    pub resolved_only: bool,

    /// Politeness delay between markets, milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_markets_path() -> String {
    "/markets".to_string()
}
fn default_history_path_template() -> String {
    "/markets/{market_id}/history".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_page_size() -> u32 {
    100
}
fn default_history_max_pages() -> u32 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_request_delay_ms() -> u64 {
    250
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            markets_path: default_markets_path(),
            history_path_template: default_history_path_template(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            listing_max_pages: 0,
            history_max_pages: default_history_max_pages(),
            resolved_only: true,
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Retry behavior for transport calls
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff cap, milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Resampling parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ResampleConfig {
    /// Resample interval in seconds
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: i64,
}

fn default_interval_seconds() -> i64 {
    10
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Destination directory for artifacts
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_true")]
    pub csv: bool,
    #[serde(default = "default_true")]
    pub svg: bool,
    #[serde(default = "default_true")]
    pub html: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            csv: true,
            svg: true,
            html: true,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject invalid values before any network call is made
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.resample.interval_seconds <= 0 {
            return Err(ResampleError::InvalidInterval(self.resample.interval_seconds).into());
        }
        if self.api.page_size == 0 {
            anyhow::bail!("api.page_size must be at least 1");
        }
        if self.api.history_max_pages == 0 {
            anyhow::bail!("api.history_max_pages must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if !self.api.history_path_template.contains("{market_id}") {
            anyhow::bail!("api.history_path_template must contain {{market_id}}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://gamma-api.polymarket.com");
        assert_eq!(config.api.markets_path, "/markets");
        assert_eq!(config.resample.interval_seconds, 10);
        assert_eq!(config.retry.max_attempts, 4);
        assert!(config.output.csv && config.output.svg && config.output.html);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [api]
            base_url = "https://example.test"
            page_size = 50
            resolved_only = false

            [retry]
            max_attempts = 2
            initial_backoff_ms = 100

            [resample]
            interval_seconds = 60

            [output]
            dir = "./artifacts"
            html = false

            [telemetry]
            log_level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://example.test");
        assert_eq!(config.api.page_size, 50);
        assert!(!config.api.resolved_only);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.resample.interval_seconds, 60);
        assert_eq!(config.output.dir, PathBuf::from("./artifacts"));
        assert!(!config.output.html);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[resample]\ninterval_seconds = 5\n").unwrap();
        assert_eq!(config.resample.interval_seconds, 5);
        assert_eq!(config.api.page_size, 100);
    }

    #[test]
    fn test_validate_rejects_nonpositive_interval() {
        let mut config = Config::default();
        config.resample.interval_seconds = 0;
        assert!(config.validate().is_err());
        config.resample.interval_seconds = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_template() {
        let mut config = Config::default();
        config.api.history_path_template = "/history".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_conversion() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2000,
        };
        let policy = config.policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(200));
        assert_eq!(policy.max_backoff, Duration::from_millis(2000));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}

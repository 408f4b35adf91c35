//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HAKKEN_*)
//! 2. A bare `GITHUB_TOKEN` environment variable
//! 3. TOML config file (if HAKKEN_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::model::SearchRange;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Comma-separated pool of GitHub API tokens.
    ///
    /// Set via HAKKEN_GITHUB_TOKEN or GITHUB_TOKEN. Required to run.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL raw file content is served from.
    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    /// Content predicate for code search; the size qualifier is appended.
    #[serde(default = "default_search_query")]
    pub search_query: String,

    /// Lower bound of the file-size domain in bytes.
    #[serde(default = "default_size_min")]
    pub size_min: u64,

    /// Upper bound of the file-size domain in bytes.
    #[serde(default = "default_size_max")]
    pub size_max: u64,

    /// Results a single search query can reach.
    #[serde(default = "default_result_cap")]
    pub result_cap: u64,

    /// Search results per page (max 100).
    #[serde(default = "default_per_page")]
    pub per_page: u8,

    /// Pages fetched per search range at most.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Width of the fetch/validate and tree-scan worker pool.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Path to the SQLite dedup cache.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Search/tree API request timeout in milliseconds.
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Raw content fetch timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum bytes to fetch per content file.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Backoff applied when a rate limit carries no reset timestamp.
    #[serde(default = "default_rate_limit_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,

    /// Floor on the wait derived from a reset timestamp.
    #[serde(default = "default_min_reset_wait_secs")]
    pub min_reset_wait_secs: u64,

    /// File extension the deep scan keeps.
    #[serde(default = "default_tracked_extension")]
    pub tracked_extension: String,

    /// Where the record set is written; stdout when unset.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".into()
}

fn default_search_query() -> String {
    "\"chapters\" extension:json".into()
}

fn default_size_min() -> u64 {
    100
}

fn default_size_max() -> u64 {
    500_000
}

fn default_result_cap() -> u64 {
    1000
}

fn default_per_page() -> u8 {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_workers() -> usize {
    12
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./hakken.sqlite")
}

fn default_user_agent() -> String {
    "hakken/0.1".into()
}

fn default_api_timeout_ms() -> u64 {
    15_000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_rate_limit_cooldown_secs() -> u64 {
    60
}

fn default_min_reset_wait_secs() -> u64 {
    5
}

fn default_tracked_extension() -> String {
    ".json".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            api_base: default_api_base(),
            raw_base: default_raw_base(),
            search_query: default_search_query(),
            size_min: default_size_min(),
            size_max: default_size_max(),
            result_cap: default_result_cap(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            max_workers: default_max_workers(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            api_timeout_ms: default_api_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_bytes: default_max_bytes(),
            rate_limit_cooldown_secs: default_rate_limit_cooldown_secs(),
            min_reset_wait_secs: default_min_reset_wait_secs(),
            tracked_extension: default_tracked_extension(),
            output_path: None,
        }
    }
}

impl AppConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn min_reset_wait(&self) -> Duration {
        Duration::from_secs(self.min_reset_wait_secs)
    }

    /// The configured file-size domain.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `size_min > size_max`.
    pub fn search_domain(&self) -> Result<SearchRange, ConfigError> {
        SearchRange::new(self.size_min, self.size_max)
            .map_err(|e| ConfigError::Invalid { field: "size_min".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HAKKEN_`
    /// 2. `GITHUB_TOKEN`
    /// 3. TOML file from `HAKKEN_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HAKKEN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(Env::raw().only(&["GITHUB_TOKEN"]).map(|_| "github_token".into()))
            .merge(
                Env::prefixed("HAKKEN_")
                    .ignore(&["CONFIG_FILE", "LOG_JSON"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Split the token pool into individual credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no non-blank token is configured.
    pub fn credentials(&self) -> Result<Vec<String>, ConfigError> {
        let tokens: Vec<String> = self
            .github_token
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        if tokens.is_empty() {
            return Err(ConfigError::Missing {
                field: "github_token".into(),
                hint: "Set HAKKEN_GITHUB_TOKEN or GITHUB_TOKEN (comma-separated for a pool)".into(),
            });
        }

        Ok(tokens)
    }
}

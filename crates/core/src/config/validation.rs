//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// Credentials are checked separately by `credentials()` so that the
    /// rest of the configuration can be inspected without a token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `size_min` exceeds `size_max`
    /// - `per_page` is outside 1..=100, or `max_pages`/`result_cap` is 0
    /// - `max_workers` is 0 or above 64
    /// - a timeout is below 100ms or above 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - a query, base URL, extension or user agent is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_min > self.size_max {
            return Err(invalid("size_min", "must not exceed size_max"));
        }

        if self.per_page == 0 || self.per_page > 100 {
            return Err(invalid("per_page", "must be between 1 and 100"));
        }
        if self.max_pages == 0 {
            return Err(invalid("max_pages", "must be greater than 0"));
        }
        if self.result_cap == 0 {
            return Err(invalid("result_cap", "must be greater than 0"));
        }
        if u64::from(self.per_page) * u64::from(self.max_pages) < self.result_cap {
            tracing::warn!(
                per_page = self.per_page,
                max_pages = self.max_pages,
                result_cap = self.result_cap,
                "per_page * max_pages is below result_cap; safe ranges may be read partially"
            );
        }

        if self.max_workers == 0 || self.max_workers > 64 {
            return Err(invalid("max_workers", "must be between 1 and 64"));
        }

        for (field, value) in [("api_timeout_ms", self.api_timeout_ms), ("fetch_timeout_ms", self.fetch_timeout_ms)] {
            if value < 100 {
                return Err(invalid(field, "must be at least 100ms"));
            }
            if value > 300_000 {
                return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        for (field, value) in [
            ("search_query", &self.search_query),
            ("api_base", &self.api_base),
            ("raw_base", &self.raw_base),
            ("tracked_extension", &self.tracked_extension),
            ("user_agent", &self.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_domain() {
        let config = AppConfig { size_min: 10, size_max: 9, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("size_min"));
    }

    #[test]
    fn test_validate_per_page_bounds() {
        let config = AppConfig { per_page: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("per_page"));

        let config = AppConfig { per_page: 101, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("per_page"));
    }

    #[test]
    fn test_validate_workers() {
        let config = AppConfig { max_workers: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_workers"));

        let config = AppConfig { max_workers: 65, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_workers"));
    }

    #[test]
    fn test_validate_timeouts() {
        let config = AppConfig { fetch_timeout_ms: 50, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("fetch_timeout_ms"));

        let config = AppConfig { api_timeout_ms: 301_000, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("api_timeout_ms"));
    }

    #[test]
    fn test_validate_max_bytes() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_bytes"));

        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_bytes"));
    }

    #[test]
    fn test_validate_empty_strings() {
        let config = AppConfig { search_query: "  ".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("search_query"));

        let config = AppConfig { tracked_extension: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("tracked_extension"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            size_min: 7,
            size_max: 7,
            per_page: 1,
            max_workers: 1,
            fetch_timeout_ms: 100,
            api_timeout_ms: 300_000,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}

//! GitHub API client error types.

use std::sync::Arc;

/// Errors from the GitHub REST client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GitHubError {
    /// No credential configured.
    #[error("missing credentials: GITHUB_TOKEN not set")]
    MissingCredentials,

    /// Request parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success status that is not a rate limit.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// The single retry after a rate-limit backoff was rate limited again.
    #[error("rate limit persisted after retry: {status}")]
    RateLimitPersisted { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { GitHubError::Timeout } else { GitHubError::Network(Arc::new(err)) }
    }
}

impl From<GitHubError> for hakken_core::Error {
    fn from(err: GitHubError) -> Self {
        hakken_core::Error::Api(err.to_string())
    }
}

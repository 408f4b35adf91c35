//! GitHub REST API client.
//!
//! Provides code search and recursive tree listing on top of a rate-limit
//! aware `get`, with credential rotation across a token pool.
//!
//! ### Rate limiting
//!
//! - A response is rate limited on 403/429, or on any failure whose quota
//!   headers report zero remaining with a reset time.
//! - The backoff is the time until `x-ratelimit-reset` (at least
//!   `min_reset_wait`), else `retry-after`, else the fixed cooldown.
//! - The request is retried exactly once. A second rate limit fails the
//!   call with `RateLimitPersisted`.

pub mod error;
pub mod request;
pub mod response;
pub mod transport;

pub use error::GitHubError;
pub use request::CodeSearchRequest;
pub use response::{CodeSearchPage, EntryKind, RepositoryTree, SearchHit, TreeEntry};
pub use transport::{ApiResponse, RateLimitInfo, ReqwestTransport, Transport};

use async_trait::async_trait;
use chrono::Utc;
use hakken_core::{AppConfig, RepositoryCoordinate};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::{CredentialRotator, Rotation};

/// Default base URL for the REST API.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default base URL for raw file content.
const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    /// Host that search hits are rewritten onto.
    pub raw_base: String,
    /// Request timeout (default: 15s).
    pub timeout: Duration,
    pub user_agent: String,
    /// Backoff when a rate limit carries no reset hint (default: 60s).
    pub cooldown: Duration,
    /// Floor for reset-derived waits (default: 5s).
    pub min_reset_wait: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            timeout: Duration::from_secs(15),
            user_agent: "hakken/0.1".to_string(),
            cooldown: Duration::from_secs(60),
            min_reset_wait: Duration::from_secs(5),
        }
    }
}

impl From<&AppConfig> for GitHubConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            timeout: config.api_timeout(),
            user_agent: config.user_agent.clone(),
            cooldown: config.rate_limit_cooldown(),
            min_reset_wait: config.min_reset_wait(),
        }
    }
}

/// The code-hosting operations discovery depends on.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Run one page of a size-restricted code search.
    async fn search_code(&self, request: &CodeSearchRequest) -> Result<CodeSearchPage, GitHubError>;

    /// List every entry of a repository's default branch.
    async fn repository_tree(&self, repository: &RepositoryCoordinate) -> Result<RepositoryTree, GitHubError>;
}

/// Rate-limited GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    config: GitHubConfig,
    rotator: Arc<CredentialRotator>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("config", &self.config)
            .field("rotator", &self.rotator)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client that talks HTTP through reqwest.
    pub fn new(config: GitHubConfig, rotator: Arc<CredentialRotator>) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::new(config.user_agent.clone(), config.timeout)?;
        Ok(Self::with_transport(config, rotator, Arc::new(transport)))
    }

    pub fn with_transport(config: GitHubConfig, rotator: Arc<CredentialRotator>, transport: Arc<dyn Transport>) -> Self {
        Self { config, rotator, transport }
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Handles one round of rate limiting: back off, rotate, retry once.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(String, String)]) -> Result<T, GitHubError> {
        let credential = self.rotator.current().await;
        let response = self.transport.get(url, query, credential.token()).await?;

        if !response.is_rate_limited() {
            return self.finish(credential.index, response).await;
        }

        let wait = self.backoff(&response.rate);
        tracing::warn!(
            url,
            status = response.status,
            credential = credential.index,
            wait_secs = wait.as_secs(),
            "rate limited"
        );

        if self.rotator.report_rate_limited(credential.index, wait).await == Rotation::Exhausted {
            tokio::time::sleep(wait).await;
        }

        let credential = self.rotator.current().await;
        let retry = self.transport.get(url, query, credential.token()).await?;
        if retry.is_rate_limited() {
            tracing::warn!(url, status = retry.status, credential = credential.index, "rate limit persisted after retry");
            return Err(GitHubError::RateLimitPersisted { status: retry.status });
        }

        self.finish(credential.index, retry).await
    }

    async fn finish<T: DeserializeOwned>(&self, index: usize, response: ApiResponse) -> Result<T, GitHubError> {
        if !response.is_success() {
            return Err(GitHubError::HttpError { status: response.status });
        }
        self.rotator.report_success(index).await;
        serde_json::from_slice(&response.body).map_err(|e| GitHubError::Parse(e.to_string()))
    }

    /// How long to wait before retrying a rate-limited call.
    fn backoff(&self, rate: &RateLimitInfo) -> Duration {
        let floor = self.config.min_reset_wait;
        if let Some(reset) = rate.reset {
            let secs = (reset - Utc::now().timestamp()).max(0) as u64;
            return Duration::from_secs(secs).max(floor);
        }
        if let Some(after) = rate.retry_after {
            return Duration::from_secs(after).max(floor);
        }
        self.config.cooldown
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn search_code(&self, request: &CodeSearchRequest) -> Result<CodeSearchPage, GitHubError> {
        request.validate()?;

        let url = format!("{}/search/code", self.config.api_base);
        tracing::debug!(range = %request.range, page = request.page, "searching code");

        let raw: response::CodeSearchApiResponse = self.get_json(&url, &request.to_query()).await?;
        Ok(CodeSearchPage::from_api(raw, &self.config.raw_base))
    }

    async fn repository_tree(&self, repository: &RepositoryCoordinate) -> Result<RepositoryTree, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/HEAD",
            self.config.api_base, repository.owner, repository.name
        );
        let query = [("recursive".to_string(), "1".to_string())];

        let raw: response::TreeApiResponse = self.get_json(&url, &query).await?;
        Ok(RepositoryTree::from(raw))
    }
}

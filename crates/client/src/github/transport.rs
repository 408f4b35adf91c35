//! HTTP transport for the REST API.
//!
//! The client talks to the API through the `Transport` trait so that the
//! rate-limit handling can be exercised against scripted responses.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap};
use std::sync::Arc;
use std::time::Duration;

use super::GitHubError;

/// Pinned REST API version.
pub const API_VERSION: &str = "2022-11-28";

/// Quota headers attached to every API response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// `x-ratelimit-remaining`
    pub remaining: Option<u64>,
    /// `x-ratelimit-reset`, epoch seconds.
    pub reset: Option<i64>,
    /// `retry-after`, seconds.
    pub retry_after: Option<u64>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }

        Self {
            remaining: parse(headers, "x-ratelimit-remaining"),
            reset: parse(headers, "x-ratelimit-reset"),
            retry_after: parse(headers, header::RETRY_AFTER.as_str()),
        }
    }
}

/// Status, quota headers and body of one API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub rate: RateLimitInfo,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 403 and 429 always count; any other failure counts when the quota
    /// headers report zero remaining with a reset time.
    pub fn is_rate_limited(&self) -> bool {
        if self.status == 403 || self.status == 429 {
            return true;
        }
        !self.is_success() && self.rate.remaining == Some(0) && self.rate.reset.is_some()
    }
}

/// One authenticated GET against the API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)], token: &str) -> Result<ApiResponse, GitHubError>;
}

/// `Transport` backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .build()
            .map_err(|e| GitHubError::Network(Arc::new(e)))?;
        Ok(Self { http, user_agent: user_agent.into() })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)], token: &str) -> Result<ApiResponse, GitHubError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(header::USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let rate = RateLimitInfo::from_headers(response.headers());
        let body = response.bytes().await?;

        tracing::debug!(url, status, remaining = ?rate.remaining, "api response");

        Ok(ApiResponse { status, rate, body })
    }
}

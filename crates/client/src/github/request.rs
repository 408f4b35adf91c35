//! Code search request parameters and validation.

use hakken_core::SearchRange;

use super::GitHubError;

/// Largest page size the search API accepts.
pub const MAX_PER_PAGE: u8 = 100;

/// One page of a code search restricted to a file-size range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSearchRequest {
    /// Base query, without the size qualifier.
    pub query: String,
    pub range: SearchRange,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u8,
    pub sort: String,
    pub order: String,
}

impl CodeSearchRequest {
    /// First page of `query` over `range`, newest-indexed first.
    pub fn new(query: impl Into<String>, range: SearchRange) -> Self {
        Self {
            query: query.into(),
            range,
            page: 1,
            per_page: MAX_PER_PAGE,
            sort: "indexed".to_string(),
            order: "desc".to_string(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page;
        self
    }

    /// The full `q` parameter: base query plus size qualifier.
    pub fn q(&self) -> String {
        format!("{} {}", self.query.trim(), self.range.size_qualifier())
    }

    pub fn validate(&self) -> Result<(), GitHubError> {
        if self.query.trim().is_empty() {
            return Err(GitHubError::InvalidRequest("query cannot be empty".to_string()));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(GitHubError::InvalidRequest(format!(
                "per_page must be 1-{MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }
        if self.page == 0 {
            return Err(GitHubError::InvalidRequest("page is 1-based".to_string()));
        }
        Ok(())
    }

    /// Query-string pairs for the search endpoint.
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("q".to_string(), self.q()),
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("sort".to_string(), self.sort.clone()),
            ("order".to_string(), self.order.clone()),
        ]
    }
}

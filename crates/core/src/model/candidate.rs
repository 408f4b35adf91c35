//! Unvalidated references to remote files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RepositoryCoordinate;

/// How a candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// A code-search hit from a range that fit under the result cap.
    Search,
    /// A file found by listing a repository tree.
    RepoScan,
    /// A code-search hit from a truncated range at the cap.
    DenseLeaf,
}

impl OriginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginKind::Search => "search",
            OriginKind::RepoScan => "repo_scan",
            OriginKind::DenseLeaf => "dense_leaf",
        }
    }
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OriginKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(OriginKind::Search),
            "repo_scan" => Ok(OriginKind::RepoScan),
            "dense_leaf" => Ok(OriginKind::DenseLeaf),
            other => Err(format!("unknown origin kind: {other}")),
        }
    }
}

/// A remote file that might hold a series document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Raw content URL; the within-run dedup key.
    pub content_url: String,
    /// Git blob SHA when the API reported one; the cross-run dedup key.
    pub digest: Option<String>,
    pub origin: OriginKind,
    /// Hosting repository, when the discovery source named it.
    #[serde(default)]
    pub repository: Option<RepositoryCoordinate>,
}

impl Candidate {
    pub fn new(content_url: impl Into<String>, digest: Option<String>, origin: OriginKind) -> Self {
        Self { content_url: content_url.into(), digest, origin, repository: None }
    }

    pub fn with_repository(mut self, repository: Option<RepositoryCoordinate>) -> Self {
        self.repository = repository;
        self
    }
}

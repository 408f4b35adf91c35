//! Repository coordinates derived from content URLs.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// `owner/name` of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryCoordinate {
    pub owner: String,
    pub name: String,
}

impl RepositoryCoordinate {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }

    /// Derive the coordinate from a raw content URL.
    ///
    /// Raw URLs have the shape `{base}/{owner}/{name}/{ref}/{path...}`, so at
    /// least three non-empty path segments are required.
    pub fn from_content_url(content_url: &str) -> Option<Self> {
        let url = Url::parse(content_url).ok()?;
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let name = segments.next()?;
        segments.next()?;
        Some(Self::new(owner, name))
    }

    /// Parse `owner/name`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepositoryCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

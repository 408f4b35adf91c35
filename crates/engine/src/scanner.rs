//! Deep scan of one repository's file tree.

use hakken_client::CodeHost;
use hakken_client::fetch::raw_content_url;
use hakken_core::{Candidate, DedupCache, Error, OriginKind, RepositoryCoordinate};
use std::sync::Arc;

/// Ref every raw URL is built against.
const SCAN_REF: &str = "HEAD";

/// Lists a repository tree and turns tracked files into candidates.
#[derive(Clone)]
pub struct RepositoryScanner {
    host: Arc<dyn CodeHost>,
    cache: DedupCache,
    raw_base: String,
    extension: String,
}

impl RepositoryScanner {
    pub fn new(
        host: Arc<dyn CodeHost>, cache: DedupCache, raw_base: impl Into<String>, extension: impl Into<String>,
    ) -> Self {
        Self { host, cache, raw_base: raw_base.into(), extension: extension.into() }
    }

    /// Candidates for every tracked blob not already known to be invalid.
    ///
    /// A truncated tree is scanned as far as it goes.
    pub async fn scan(&self, repository: &RepositoryCoordinate) -> Result<Vec<Candidate>, Error> {
        let tree = self.host.repository_tree(repository).await?;
        if tree.truncated {
            tracing::warn!(%repository, entries = tree.entries.len(), "tree truncated, scan coverage is partial");
        }

        let mut candidates = Vec::new();
        let mut rejected = 0usize;
        for entry in tree.blobs_with_extension(&self.extension) {
            match self.cache.verdict(&entry.digest).await {
                Ok(Some(record)) if !record.is_valid => {
                    rejected += 1;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(%repository, digest = %entry.digest, error = %e, "cache lookup failed, keeping entry");
                }
            }

            match raw_content_url(&self.raw_base, repository, SCAN_REF, &entry.path) {
                Ok(url) => candidates.push(
                    Candidate::new(url, Some(entry.digest.clone()), OriginKind::RepoScan)
                        .with_repository(Some(repository.clone())),
                ),
                Err(e) => tracing::warn!(%repository, path = %entry.path, error = %e, "cannot build raw URL"),
            }
        }

        tracing::debug!(%repository, candidates = candidates.len(), rejected, "repository scanned");
        Ok(candidates)
    }
}

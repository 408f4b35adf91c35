//! In-memory stand-ins for the code host and the content fetcher.

use async_trait::async_trait;
use bytes::Bytes;
use hakken_client::{CodeHost, CodeSearchPage, CodeSearchRequest, ContentFetcher, GitHubError, RepositoryTree, SearchHit};
use hakken_core::{Error, RepositoryCoordinate, SearchRange};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A file the stub search index knows about.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    pub size: u64,
    pub content_url: String,
    pub digest: String,
}

/// Code host with either scripted per-range totals or a sized corpus.
#[derive(Default)]
pub struct StubHost {
    /// Totals per exact range; items are synthesized.
    pub totals: HashMap<(u64, u64), u64>,
    /// When non-empty, totals and items come from this corpus instead.
    pub corpus: Vec<CorpusFile>,
    pub trees: HashMap<RepositoryCoordinate, RepositoryTree>,
    pub failing_ranges: HashSet<(u64, u64)>,
    pub failing_pages: HashSet<((u64, u64), u32)>,
    pub searches: Mutex<Vec<CodeSearchRequest>>,
    pub tree_calls: Mutex<Vec<RepositoryCoordinate>>,
}

impl StubHost {
    pub fn with_totals(totals: &[((u64, u64), u64)]) -> Self {
        Self { totals: totals.iter().copied().collect(), ..Default::default() }
    }

    pub fn with_corpus(corpus: Vec<CorpusFile>) -> Self {
        Self { corpus, ..Default::default() }
    }

    pub fn searched_ranges(&self) -> Vec<SearchRange> {
        self.searches.lock().unwrap().iter().map(|r| r.range).collect()
    }

    fn hits(&self, range: SearchRange, start: u64, end: u64) -> (u64, Vec<SearchHit>) {
        if !self.corpus.is_empty() {
            let matching: Vec<&CorpusFile> = self.corpus.iter().filter(|f| range.contains(f.size)).collect();
            let total = matching.len() as u64;
            let hits = matching
                .iter()
                .skip(start as usize)
                .take(end.min(total).saturating_sub(start) as usize)
                .map(|f| SearchHit {
                    content_url: f.content_url.clone(),
                    digest: Some(f.digest.clone()),
                    repository: RepositoryCoordinate::from_content_url(&f.content_url),
                })
                .collect();
            return (total, hits);
        }

        let total = self.totals.get(&(range.low(), range.high())).copied().unwrap_or(0);
        let hits = (start..end.min(total))
            .map(|i| SearchHit {
                content_url: format!(
                    "https://raw.githubusercontent.com/stub/r{}-{}/HEAD/{i}.json",
                    range.low(),
                    range.high()
                ),
                digest: Some(format!("{}-{}-{i}", range.low(), range.high())),
                repository: Some(RepositoryCoordinate::new("stub", format!("r{}-{}", range.low(), range.high()))),
            })
            .collect();
        (total, hits)
    }
}

#[async_trait]
impl CodeHost for StubHost {
    async fn search_code(&self, request: &CodeSearchRequest) -> Result<CodeSearchPage, GitHubError> {
        self.searches.lock().unwrap().push(request.clone());
        let key = (request.range.low(), request.range.high());
        if self.failing_ranges.contains(&key) || self.failing_pages.contains(&(key, request.page)) {
            return Err(GitHubError::HttpError { status: 422 });
        }

        let per_page = u64::from(request.per_page);
        let start = u64::from(request.page - 1) * per_page;
        let (total_count, hits) = self.hits(request.range, start, start + per_page);
        Ok(CodeSearchPage { total_count, incomplete_results: false, items_returned: hits.len(), hits })
    }

    async fn repository_tree(&self, repository: &RepositoryCoordinate) -> Result<RepositoryTree, GitHubError> {
        self.tree_calls.lock().unwrap().push(repository.clone());
        self.trees.get(repository).cloned().ok_or(GitHubError::HttpError { status: 404 })
    }
}

/// Serves canned bodies by URL and tracks concurrency.
#[derive(Default)]
pub struct StubFetcher {
    pub bodies: HashMap<String, Bytes>,
    pub delay: Duration,
    pub fetches: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubFetcher {
    pub fn with_bodies<I, K, V>(bodies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            bodies: bodies.into_iter().map(|(k, v)| (k.into(), Bytes::from(v.into()))).collect(),
            ..Default::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentFetcher for StubFetcher {
    async fn fetch_content(&self, url: &str) -> Result<Bytes, Error> {
        self.fetches.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| Error::HttpError("status 404".to_string()))
    }
}

/// A schema-valid series document.
pub fn series_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "description": "desc",
        "artist": "artist",
        "author": "author",
        "cover": "https://img.example/cover.png",
        "chapters": {
            "1": {"title": "Start", "volume": "1", "groups": {"scans": "https://x/1"}},
            "2": {"title": "Broken"}
        }
    })
    .to_string()
}

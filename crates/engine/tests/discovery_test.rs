//! End-to-end discovery against a scripted API and content host.

use async_trait::async_trait;
use bytes::Bytes;
use hakken_client::github::{ApiResponse, RateLimitInfo, Transport};
use hakken_client::{ContentFetcher, CredentialRotator, GitHubClient, GitHubConfig, GitHubError};
use hakken_core::{AppConfig, DedupCache, Error, OriginKind};
use hakken_engine::{DiscoveryEngine, EngineSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const PER_PAGE: u64 = 100;

/// Answers code search with fixed per-range totals and every tree request
/// with a single extra file.
struct ScriptedApi {
    totals: HashMap<(u64, u64), u64>,
    searched: Mutex<Vec<(u64, u64, u64)>>,
}

impl ScriptedApi {
    fn new(totals: &[((u64, u64), u64)]) -> Self {
        Self { totals: totals.iter().copied().collect(), searched: Mutex::default() }
    }

    fn search(&self, query: &[(String, String)]) -> serde_json::Value {
        let param = |name: &str| query.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()).unwrap_or_default();
        let q = param("q");
        let size = q.rsplit("size:").next().unwrap();
        let (low, high) = size.split_once("..").unwrap();
        let (low, high): (u64, u64) = (low.parse().unwrap(), high.parse().unwrap());
        let page: u64 = param("page").parse().unwrap();
        self.searched.lock().unwrap().push((low, high, page));

        let total = self.totals.get(&(low, high)).copied().unwrap_or(0);
        let start = (page - 1) * PER_PAGE;
        let items: Vec<_> = (start..(start + PER_PAGE).min(total))
            .map(|i| {
                serde_json::json!({
                    "path": format!("{i}.json"),
                    "sha": format!("sha-{low}-{high}-{i}"),
                    "html_url": format!("https://github.com/stub/r{low}-{high}/blob/0a1b/{i}.json"),
                })
            })
            .collect();
        serde_json::json!({"total_count": total, "incomplete_results": false, "items": items})
    }
}

#[async_trait]
impl Transport for ScriptedApi {
    async fn get(&self, url: &str, query: &[(String, String)], _token: &str) -> Result<ApiResponse, GitHubError> {
        let body = if url.ends_with("/search/code") {
            self.search(query)
        } else if url.contains("/git/trees/") {
            serde_json::json!({
                "sha": "tree",
                "truncated": false,
                "tree": [
                    {"path": "extra", "type": "tree", "sha": "t"},
                    {"path": "extra/bonus.json", "type": "blob", "sha": format!("bonus-{url}")}
                ]
            })
        } else {
            return Ok(ApiResponse { status: 404, rate: RateLimitInfo::default(), body: Bytes::new() });
        };
        Ok(ApiResponse { status: 200, rate: RateLimitInfo::default(), body: Bytes::from(body.to_string()) })
    }
}

/// Every URL serves a valid series titled after its path.
struct EchoFetcher;

#[async_trait]
impl ContentFetcher for EchoFetcher {
    async fn fetch_content(&self, url: &str) -> Result<Bytes, Error> {
        let body = serde_json::json!({
            "title": url,
            "description": "",
            "artist": "",
            "author": "",
            "cover": "",
            "chapters": {"1": {"title": "One", "volume": 1, "groups": {"g": "https://x"}}}
        });
        Ok(Bytes::from(body.to_string()))
    }
}

async fn engine(api: Arc<ScriptedApi>, size_max: u64) -> (DiscoveryEngine, DedupCache) {
    let rotator = Arc::new(CredentialRotator::new(vec!["token".to_string()]).unwrap());
    let client = GitHubClient::with_transport(GitHubConfig::default(), rotator, api);
    let cache = DedupCache::open_in_memory().await.unwrap();
    let config = AppConfig { size_min: 0, size_max, ..Default::default() };
    let settings = EngineSettings::from_config(&config).unwrap();
    (DiscoveryEngine::new(Arc::new(client), Arc::new(EchoFetcher), cache.clone(), settings), cache)
}

#[tokio::test]
async fn test_small_domain_single_page_then_deep_scan() {
    let api = Arc::new(ScriptedApi::new(&[((0, 100), 5)]));
    let (engine, cache) = engine(api.clone(), 100).await;

    let report = engine.run().await;

    assert_eq!(*api.searched.lock().unwrap(), vec![(0, 100, 1)]);
    assert_eq!(report.search.validated, 5);
    assert_eq!(report.repositories_scanned, 1);
    assert_eq!(report.deep.validated, 1);
    assert_eq!(report.records.len(), 6);
    assert!(report.records[..5].iter().all(|r| r.origin == OriginKind::Search));
    assert_eq!(report.records[5].origin, OriginKind::RepoScan);
    assert_eq!(report.records[5].source_url, "https://raw.githubusercontent.com/stub/r0-100/HEAD/extra/bonus.json");
    assert_eq!(report.records[0].repository_name, "stub/r0-100");
    assert_eq!(cache.stats().await.unwrap().valid, 6);
}

#[tokio::test]
async fn test_over_cap_domain_is_bisected() {
    let api = Arc::new(ScriptedApi::new(&[
        ((0, 100), 1500),
        ((0, 50), 400),
        ((51, 100), 1100),
        ((51, 75), 300),
        ((76, 100), 800),
    ]));
    let (engine, _) = engine(api, 100).await;

    let report = engine.run().await;

    assert_eq!(report.partition.candidates, 1500);
    assert_eq!(report.partition.safe_leaves, 3);
    assert_eq!(report.search.validated, 1500);
    assert_eq!(report.repositories_scanned, 3);
    assert_eq!(report.deep.validated, 3);
    assert_eq!(report.records.len(), 1503);
}

#[tokio::test]
async fn test_second_run_revalidates_positives_and_finds_same_records() {
    let api = Arc::new(ScriptedApi::new(&[((0, 100), 3)]));
    let (first_engine, cache) = engine(api.clone(), 100).await;
    let first = first_engine.run().await;

    let rotator = Arc::new(CredentialRotator::new(vec!["token".to_string()]).unwrap());
    let client = GitHubClient::with_transport(GitHubConfig::default(), rotator, api);
    let settings = EngineSettings::from_config(&AppConfig { size_min: 0, size_max: 100, ..Default::default() }).unwrap();
    let second = DiscoveryEngine::new(Arc::new(client), Arc::new(EchoFetcher), cache.clone(), settings).run().await;

    assert_eq!(first.records.len(), second.records.len());
    assert_eq!(cache.stats().await.unwrap().total, 4);
}

//! Code search and git tree response types and normalization.

use hakken_core::RepositoryCoordinate;
use serde::{Deserialize, Serialize};

use crate::fetch::url::to_raw_url;

/// Raw response from `GET /search/code`.
#[derive(Debug, Deserialize)]
pub struct CodeSearchApiResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<CodeSearchItem>,
}

/// Individual code search hit.
#[derive(Debug, Deserialize)]
pub struct CodeSearchItem {
    pub html_url: String,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub repository: Option<CodeSearchRepository>,
}

#[derive(Debug, Deserialize)]
pub struct CodeSearchRepository {
    pub full_name: String,
}

impl CodeSearchItem {
    /// The hit's repository: `repository.full_name`, else read off `html_url`.
    fn repository(&self) -> Option<RepositoryCoordinate> {
        self.repository
            .as_ref()
            .and_then(|repo| RepositoryCoordinate::parse(&repo.full_name))
            .or_else(|| RepositoryCoordinate::from_content_url(&self.html_url))
    }
}

/// A search hit mapped onto the raw-content host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub content_url: String,
    pub digest: Option<String>,
    pub repository: Option<RepositoryCoordinate>,
}

/// One normalized page of code search results.
#[derive(Debug, Clone, Serialize)]
pub struct CodeSearchPage {
    pub total_count: u64,
    pub incomplete_results: bool,
    /// Items the API returned on this page, including unmappable ones.
    pub items_returned: usize,
    pub hits: Vec<SearchHit>,
}

impl CodeSearchPage {
    /// Normalize a raw page, rewriting HTML blob URLs under `raw_base`.
    ///
    /// Hits whose URL cannot be mapped are dropped with a warning.
    pub fn from_api(raw: CodeSearchApiResponse, raw_base: &str) -> Self {
        let items_returned = raw.items.len();
        let hits = raw
            .items
            .into_iter()
            .filter_map(|item| match to_raw_url(&item.html_url, raw_base) {
                Some(content_url) => {
                    let repository = item.repository();
                    Some(SearchHit { content_url, digest: item.sha, repository })
                }
                None => {
                    tracing::warn!(html_url = %item.html_url, path = %item.path, "dropping unmappable search hit");
                    None
                }
            })
            .collect();

        Self { total_count: raw.total_count, incomplete_results: raw.incomplete_results, items_returned, hits }
    }
}

/// Raw response from `GET /repos/{owner}/{name}/git/trees/{ref}`.
#[derive(Debug, Deserialize)]
pub struct TreeApiResponse {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub tree: Vec<TreeApiEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TreeApiEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Git object kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
    Other,
}

impl From<&str> for EntryKind {
    fn from(kind: &str) -> Self {
        match kind {
            "blob" => EntryKind::Blob,
            "tree" => EntryKind::Tree,
            "commit" => EntryKind::Commit,
            _ => EntryKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    /// Git blob SHA.
    pub digest: String,
    pub size: Option<u64>,
}

/// Flattened recursive listing of one repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryTree {
    /// Set when the API cut the listing short.
    pub truncated: bool,
    pub entries: Vec<TreeEntry>,
}

impl From<TreeApiResponse> for RepositoryTree {
    fn from(raw: TreeApiResponse) -> Self {
        let entries = raw
            .tree
            .into_iter()
            .map(|e| TreeEntry { kind: EntryKind::from(e.kind.as_str()), path: e.path, digest: e.sha, size: e.size })
            .collect();
        Self { truncated: raw.truncated, entries }
    }
}

impl RepositoryTree {
    /// Blob entries whose path ends with `extension`.
    pub fn blobs_with_extension<'a>(&'a self, extension: &'a str) -> impl Iterator<Item = &'a TreeEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.kind == EntryKind::Blob && e.path.ends_with(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_BASE: &str = "https://raw.githubusercontent.com";

    const SEARCH_FIXTURE: &str = r#"{
        "total_count": 1500,
        "incomplete_results": false,
        "items": [
            {
                "name": "one.json",
                "path": "series/one.json",
                "sha": "aaa111",
                "html_url": "https://github.com/alice/cubari/blob/4f2c/series/one.json"
            },
            {
                "name": "two.json",
                "path": "two.json",
                "sha": "bbb222",
                "html_url": "https://gist.github.com/whatever"
            }
        ]
    }"#;

    const TREE_FIXTURE: &str = r#"{
        "sha": "deadbeef",
        "truncated": true,
        "tree": [
            {"path": "README.md", "type": "blob", "sha": "r1", "size": 10},
            {"path": "series", "type": "tree", "sha": "t1"},
            {"path": "series/a.json", "type": "blob", "sha": "s1", "size": 300},
            {"path": "vendor/lib", "type": "commit", "sha": "c1"}
        ]
    }"#;

    #[test]
    fn test_search_page_maps_and_drops() {
        let raw: CodeSearchApiResponse = serde_json::from_str(SEARCH_FIXTURE).unwrap();
        let page = CodeSearchPage::from_api(raw, RAW_BASE);

        assert_eq!(page.total_count, 1500);
        assert_eq!(page.items_returned, 2);
        assert_eq!(page.hits.len(), 1);
        assert_eq!(
            page.hits[0].content_url,
            "https://raw.githubusercontent.com/alice/cubari/4f2c/series/one.json"
        );
        assert_eq!(page.hits[0].digest.as_deref(), Some("aaa111"));
        assert_eq!(page.hits[0].repository, Some(RepositoryCoordinate::new("alice", "cubari")));
    }

    #[test]
    fn test_search_hit_repository_survives_prefixed_raw_base() {
        let raw: CodeSearchApiResponse = serde_json::from_str(
            r#"{"total_count": 1, "items": [{
                "sha": "aaa111",
                "html_url": "https://github.com/alice/cubari/blob/4f2c/one.json",
                "repository": {"full_name": "alice/cubari"}
            }]}"#,
        )
        .unwrap();
        let page = CodeSearchPage::from_api(raw, "http://mirror.local/raw");

        assert_eq!(page.hits[0].content_url, "http://mirror.local/raw/alice/cubari/4f2c/one.json");
        assert_eq!(page.hits[0].repository, Some(RepositoryCoordinate::new("alice", "cubari")));
    }

    #[test]
    fn test_search_page_without_items() {
        let raw: CodeSearchApiResponse = serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        let page = CodeSearchPage::from_api(raw, RAW_BASE);
        assert_eq!(page.total_count, 0);
        assert!(page.hits.is_empty());
    }

    #[test]
    fn test_tree_normalization() {
        let raw: TreeApiResponse = serde_json::from_str(TREE_FIXTURE).unwrap();
        let tree = RepositoryTree::from(raw);

        assert!(tree.truncated);
        assert_eq!(tree.entries.len(), 4);
        assert_eq!(tree.entries[1].kind, EntryKind::Tree);
        assert_eq!(tree.entries[3].kind, EntryKind::Commit);

        let json: Vec<_> = tree.blobs_with_extension(".json").collect();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0].path, "series/a.json");
        assert_eq!(json[0].digest, "s1");
    }
}

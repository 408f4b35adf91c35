//! Range-partitioned code search.
//!
//! The search API truncates every query at a fixed result cap. To see past
//! it, the size domain is bisected until each range reports a total at or
//! under the cap, then every such range is paged in full. Ranges that span
//! at most two sizes and still exceed the cap are dense leaves: their first
//! pages are kept and the rest is lost.
//!
//! The accepted leaves of one run are disjoint and together cover the
//! domain, except for ranges whose query failed, which are reported.

use hakken_client::{CodeHost, CodeSearchPage, CodeSearchRequest, SearchHit};
use hakken_core::{AppConfig, Candidate, OriginKind, SearchRange};
use serde::Serialize;
use std::sync::Arc;

/// Search parameters shared by every range query.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    pub query: String,
    /// Results the API returns at most per query.
    pub cap: u64,
    pub per_page: u8,
    /// Safety bound on pages read per range.
    pub max_pages: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { query: "\"chapters\" extension:json".to_string(), cap: 1000, per_page: 100, max_pages: 10 }
    }
}

impl From<&AppConfig> for PartitionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            query: config.search_query.clone(),
            cap: config.result_cap,
            per_page: config.per_page,
            max_pages: config.max_pages,
        }
    }
}

/// How a leaf range was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    Empty,
    Safe,
    /// Over the cap and too narrow to split; results truncated.
    Dense,
}

/// A range that was not split further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaf {
    pub range: SearchRange,
    pub depth: u32,
    /// Total the API reported for the range.
    pub total: u64,
    pub kind: LeafKind,
    /// Candidates actually collected from the range.
    pub collected: usize,
}

/// Everything one partition run produced.
#[derive(Debug, Clone, Default)]
pub struct PartitionOutcome {
    pub candidates: Vec<Candidate>,
    pub leaves: Vec<Leaf>,
    /// Ranges whose first query failed; their contents are unknown.
    pub failed: Vec<SearchRange>,
}

/// Counts over a partition ledger, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub candidates: usize,
    pub empty_leaves: usize,
    pub safe_leaves: usize,
    pub dense_leaves: usize,
    pub failed_ranges: usize,
    pub max_depth: u32,
}

impl PartitionOutcome {
    pub fn summary(&self) -> PartitionSummary {
        let count = |kind: LeafKind| self.leaves.iter().filter(|l| l.kind == kind).count();
        PartitionSummary {
            candidates: self.candidates.len(),
            empty_leaves: count(LeafKind::Empty),
            safe_leaves: count(LeafKind::Safe),
            dense_leaves: count(LeafKind::Dense),
            failed_ranges: self.failed.len(),
            max_depth: self.leaves.iter().map(|l| l.depth).max().unwrap_or(0),
        }
    }
}

/// Sequential bisecting search over the size domain.
#[derive(Clone)]
pub struct RangePartitioner {
    host: Arc<dyn CodeHost>,
    config: PartitionConfig,
}

impl RangePartitioner {
    pub fn new(host: Arc<dyn CodeHost>, config: PartitionConfig) -> Self {
        Self { host, config }
    }

    /// Enumerate candidates over `domain`.
    ///
    /// Never fails as a whole: a failed range query is logged and recorded
    /// in `failed`, and the walk continues with the remaining ranges.
    pub async fn partition(&self, domain: SearchRange) -> PartitionOutcome {
        let mut outcome = PartitionOutcome::default();
        let mut stack = vec![(domain, 0u32)];

        while let Some((range, depth)) = stack.pop() {
            let first = match self.search(range, 1).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(%range, depth, error = %e, "range query failed");
                    outcome.failed.push(range);
                    continue;
                }
            };
            let total = first.total_count;
            tracing::debug!(%range, depth, total, "range total");

            if total == 0 {
                outcome.leaves.push(Leaf { range, depth, total, kind: LeafKind::Empty, collected: 0 });
                continue;
            }

            let (kind, origin) = if total <= self.config.cap {
                (LeafKind::Safe, OriginKind::Search)
            } else if let Some((left, right)) = range.split().filter(|_| !range.is_dense()) {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
                continue;
            } else {
                tracing::warn!(
                    %range,
                    total,
                    cap = self.config.cap,
                    "exhausted partition: dense leaf over the cap, keeping the first pages only"
                );
                (LeafKind::Dense, OriginKind::DenseLeaf)
            };

            let before = outcome.candidates.len();
            self.drain(range, total, first, origin, &mut outcome.candidates).await;
            let collected = outcome.candidates.len() - before;
            outcome.leaves.push(Leaf { range, depth, total, kind, collected });
        }

        let summary = outcome.summary();
        tracing::info!(
            %domain,
            candidates = summary.candidates,
            safe = summary.safe_leaves,
            dense = summary.dense_leaves,
            empty = summary.empty_leaves,
            failed = summary.failed_ranges,
            max_depth = summary.max_depth,
            "partition complete"
        );
        outcome
    }

    async fn search(&self, range: SearchRange, page: u32) -> Result<CodeSearchPage, hakken_client::GitHubError> {
        let request = CodeSearchRequest::new(self.config.query.clone(), range)
            .with_page(page)
            .with_per_page(self.config.per_page);
        self.host.search_code(&request).await
    }

    /// Collect every page of a leaf, starting from the already-read first.
    ///
    /// Reads `⌈total / per_page⌉` pages bounded by `max_pages`, stopping
    /// early after a short page. A failed page keeps what was collected.
    async fn drain(
        &self, range: SearchRange, total: u64, first: CodeSearchPage, origin: OriginKind, out: &mut Vec<Candidate>,
    ) {
        let per_page = u64::from(self.config.per_page.max(1));
        let pages = total.div_ceil(per_page).min(u64::from(self.config.max_pages)) as u32;

        let mut short = first.items_returned < per_page as usize;
        out.extend(first.hits.into_iter().map(|hit| candidate(hit, origin)));

        for page in 2..=pages {
            if short {
                break;
            }
            match self.search(range, page).await {
                Ok(next) => {
                    short = next.items_returned < per_page as usize;
                    out.extend(next.hits.into_iter().map(|hit| candidate(hit, origin)));
                }
                Err(e) => {
                    tracing::warn!(%range, page, error = %e, "page query failed, keeping earlier pages");
                    break;
                }
            }
        }
    }
}

fn candidate(hit: SearchHit, origin: OriginKind) -> Candidate {
    Candidate::new(hit.content_url, hit.digest, origin).with_repository(hit.repository)
}

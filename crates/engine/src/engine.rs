//! Two-stage discovery run.
//!
//! ```text
//! SearchDiscovery -> ValidateSearchResults -> DeepScan -> ValidateDeepResults -> Done
//! ```
//!
//! Stage one partitions the size domain and validates every hit. Every
//! repository that produced a valid record is then listed in full, and
//! the files found that way are validated with the same pipeline, so a
//! file already handled during search is not handled again.

use hakken_client::{CodeHost, ContentFetcher};
use hakken_core::{AppConfig, Candidate, ConfigError, DedupCache, RepositoryCoordinate, SearchRange, ValidatedRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::partition::{PartitionConfig, PartitionSummary, RangePartitioner};
use crate::pipeline::{CandidatePipeline, PipelineStats};
use crate::scanner::RepositoryScanner;

/// Engine state; only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SearchDiscovery,
    ValidateSearchResults,
    DeepScan,
    ValidateDeepResults,
    Done,
}

impl Stage {
    /// The following stage; `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::SearchDiscovery => Stage::ValidateSearchResults,
            Stage::ValidateSearchResults => Stage::DeepScan,
            Stage::DeepScan => Stage::ValidateDeepResults,
            Stage::ValidateDeepResults | Stage::Done => Stage::Done,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SearchDiscovery => "search_discovery",
            Stage::ValidateSearchResults => "validate_search_results",
            Stage::DeepScan => "deep_scan",
            Stage::ValidateDeepResults => "validate_deep_results",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run parameters derived from `AppConfig`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub domain: SearchRange,
    pub partition: PartitionConfig,
    /// Worker bound for validation and tree scans.
    pub workers: usize,
    pub raw_base: String,
    pub extension: String,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            domain: config.search_domain()?,
            partition: PartitionConfig::from(config),
            workers: config.max_workers,
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            extension: config.tracked_extension.clone(),
        })
    }
}

/// Outcome of one full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// Search-stage records followed by deep-scan records.
    pub records: Vec<ValidatedRecord>,
    pub partition: PartitionSummary,
    pub failed_ranges: Vec<SearchRange>,
    pub search: PipelineStats,
    pub deep: PipelineStats,
    pub repositories_scanned: usize,
    pub repositories_failed: usize,
}

/// Orchestrates partitioner, pipeline and scanner.
pub struct DiscoveryEngine {
    host: Arc<dyn CodeHost>,
    fetcher: Arc<dyn ContentFetcher>,
    cache: DedupCache,
    settings: EngineSettings,
}

impl DiscoveryEngine {
    pub fn new(
        host: Arc<dyn CodeHost>, fetcher: Arc<dyn ContentFetcher>, cache: DedupCache, settings: EngineSettings,
    ) -> Self {
        Self { host, fetcher, cache, settings }
    }

    /// Run every stage to completion.
    ///
    /// Per-item failures are counted in the report; the run itself cannot fail.
    pub async fn run(&self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        let pipeline = CandidatePipeline::new(self.fetcher.clone(), self.cache.clone(), self.settings.workers);

        let mut stage = Stage::SearchDiscovery;
        tracing::info!(stage = %stage, domain = %self.settings.domain, "discovery started");

        let partitioner = RangePartitioner::new(self.host.clone(), self.settings.partition.clone());
        let outcome = partitioner.partition(self.settings.domain).await;
        report.partition = outcome.summary();
        report.failed_ranges = outcome.failed;

        stage = advance(stage);
        let search = pipeline.run(outcome.candidates).await;
        report.search = search.stats;

        let repositories: BTreeSet<RepositoryCoordinate> =
            search.records.iter().filter_map(ValidatedRecord::repository).collect();
        report.records = search.records;

        stage = advance(stage);
        tracing::info!(repositories = repositories.len(), "deep scanning repositories");
        let (candidates, scanned, failed) = self.deep_scan(repositories).await;
        report.repositories_scanned = scanned;
        report.repositories_failed = failed;

        stage = advance(stage);
        let deep = pipeline.run(candidates).await;
        report.deep = deep.stats;
        report.records.extend(deep.records);

        stage = advance(stage);
        tracing::info!(
            stage = %stage,
            records = report.records.len(),
            search_validated = report.search.validated,
            deep_validated = report.deep.validated,
            repositories_scanned = report.repositories_scanned,
            repositories_failed = report.repositories_failed,
            "discovery finished"
        );
        report
    }

    /// Scan each repository once under the worker bound.
    async fn deep_scan(&self, repositories: BTreeSet<RepositoryCoordinate>) -> (Vec<Candidate>, usize, usize) {
        let scanner = RepositoryScanner::new(
            self.host.clone(),
            self.cache.clone(),
            self.settings.raw_base.clone(),
            self.settings.extension.clone(),
        );
        let semaphore = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let mut join_set = JoinSet::new();

        for repository in repositories {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let scanner = scanner.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let result = scanner.scan(&repository).await;
                (repository, result)
            });
        }

        let mut candidates = Vec::new();
        let (mut scanned, mut failed) = (0, 0);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(found))) => {
                    scanned += 1;
                    candidates.extend(found);
                }
                Ok((repository, Err(e))) => {
                    failed += 1;
                    tracing::warn!(%repository, error = %e, "repository scan failed");
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(error = %e, "scan task aborted");
                }
            }
        }
        (candidates, scanned, failed)
    }
}

fn advance(stage: Stage) -> Stage {
    let next = stage.next();
    tracing::info!(from = %stage, to = %next, "stage transition");
    next
}

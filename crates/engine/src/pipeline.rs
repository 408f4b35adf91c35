//! Fetch-and-validate pipeline.
//!
//! Turns candidates into validated records under a bounded worker pool.
//! Every candidate is handled at most once per pipeline: a repeat of an
//! already-claimed URL or digest is dropped before scheduling (the seen-set
//! is shared by clones). Every attempt with a known digest leaves a verdict
//! in the dedup cache.

use chrono::Utc;
use hakken_client::ContentFetcher;
use hakken_core::{Candidate, DedupCache, Error, ValidatedRecord, validate_series};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Per-run counters, one bucket per candidate outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub submitted: usize,
    /// Dropped because the URL or digest was already handled this run.
    pub duplicates: usize,
    pub validated: usize,
    /// Skipped without fetching: digest cached as invalid.
    pub previously_rejected: usize,
    pub fetch_failed: usize,
    pub malformed: usize,
    pub schema_invalid: usize,
    /// Verdicts that could not be written; the candidate outcome stands.
    pub cache_write_failed: usize,
}

impl PipelineStats {
    fn record_error(&mut self, error: &Error) {
        match error {
            Error::PreviouslyRejected(_) => self.previously_rejected += 1,
            Error::MalformedContent(_) => self.malformed += 1,
            Error::SchemaInvalid(_) => self.schema_invalid += 1,
            _ => self.fetch_failed += 1,
        }
    }
}

/// Records produced by one `run`, in completion order.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub records: Vec<ValidatedRecord>,
    pub stats: PipelineStats,
}

struct Evaluation {
    result: Result<ValidatedRecord, Error>,
    cache_write_failed: bool,
}

#[derive(Debug, Default)]
struct Seen {
    urls: HashSet<String>,
    digests: HashSet<String>,
}

#[derive(Clone)]
pub struct CandidatePipeline {
    fetcher: Arc<dyn ContentFetcher>,
    cache: DedupCache,
    workers: usize,
    seen: Arc<Mutex<Seen>>,
}

impl CandidatePipeline {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, cache: DedupCache, workers: usize) -> Self {
        Self { fetcher, cache, workers: workers.max(1), seen: Arc::default() }
    }

    /// Mark a candidate as handled; false if its URL or digest already was.
    ///
    /// The check and the insert happen under one lock.
    pub fn claim(&self, candidate: &Candidate) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if seen.urls.contains(&candidate.content_url) {
            return false;
        }
        if let Some(digest) = &candidate.digest
            && !seen.digests.insert(digest.clone())
        {
            return false;
        }
        seen.urls.insert(candidate.content_url.clone());
        true
    }

    /// Validate one candidate, writing its verdict to the cache.
    ///
    /// Does not consult the seen-set; `run` does that before scheduling.
    pub async fn validate(&self, candidate: &Candidate) -> Result<ValidatedRecord, Error> {
        self.evaluate(candidate).await.result
    }

    /// Validate a batch under the worker bound.
    ///
    /// Never fails: each candidate ends up as a record or as a counter.
    pub async fn run(&self, candidates: Vec<Candidate>) -> PipelineReport {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();
        let mut report = PipelineReport::default();

        for candidate in candidates {
            report.stats.submitted += 1;
            if !self.claim(&candidate) {
                report.stats.duplicates += 1;
                continue;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let pipeline = self.clone();
            join_set.spawn(async move {
                // hold the permit for the whole task
                let _permit = permit;
                pipeline.evaluate(&candidate).await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let evaluation = match joined {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    tracing::error!(error = %e, "validation task aborted");
                    report.stats.fetch_failed += 1;
                    continue;
                }
            };

            if evaluation.cache_write_failed {
                report.stats.cache_write_failed += 1;
            }
            match evaluation.result {
                Ok(record) => {
                    report.stats.validated += 1;
                    report.records.push(record);
                }
                Err(e) => report.stats.record_error(&e),
            }
        }

        tracing::info!(
            submitted = report.stats.submitted,
            validated = report.stats.validated,
            duplicates = report.stats.duplicates,
            previously_rejected = report.stats.previously_rejected,
            fetch_failed = report.stats.fetch_failed,
            malformed = report.stats.malformed,
            schema_invalid = report.stats.schema_invalid,
            "pipeline batch complete"
        );
        report
    }

    async fn evaluate(&self, candidate: &Candidate) -> Evaluation {
        if let Some(digest) = &candidate.digest {
            match self.cache.verdict(digest).await {
                Ok(Some(record)) if !record.is_valid => {
                    tracing::debug!(url = %candidate.content_url, %digest, "previously rejected");
                    return Evaluation { result: Err(Error::PreviouslyRejected(digest.clone())), cache_write_failed: false };
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(%digest, error = %e, "cache lookup failed"),
            }
        }

        let result = self.fetch_and_validate(candidate).await;
        if let Err(e) = &result {
            tracing::debug!(url = %candidate.content_url, error = %e, "candidate rejected");
        }

        let cache_write_failed = match &candidate.digest {
            Some(digest) => {
                let written = self
                    .cache
                    .save_result(digest, &candidate.content_url, result.is_ok(), candidate.origin)
                    .await;
                if let Err(e) = &written {
                    tracing::warn!(%digest, error = %e, "cache write failed");
                }
                written.is_err()
            }
            None => false,
        };

        Evaluation { result, cache_write_failed }
    }

    async fn fetch_and_validate(&self, candidate: &Candidate) -> Result<ValidatedRecord, Error> {
        let bytes = self.fetcher.fetch_content(&candidate.content_url).await?;

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::MalformedContent(format!("not JSON: {e}")))?;
        if !value.is_object() {
            return Err(Error::MalformedContent("expected a JSON object".to_string()));
        }

        let document = validate_series(&value)?;
        let record = ValidatedRecord::from_document(document, candidate.content_url.clone(), candidate.origin, Utc::now());
        Ok(match &candidate.repository {
            Some(repository) => record.with_repository(repository),
            None => record,
        })
    }
}

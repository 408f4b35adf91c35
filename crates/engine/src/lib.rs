//! Discovery engine for hakken.
//!
//! This crate composes the network clients and the dedup cache into the
//! two-stage discovery run:
//! - range-partitioned code search under the result cap
//! - bounded-concurrency fetch and validation of candidates
//! - deep scan of every repository that produced a valid record

pub mod engine;
pub mod partition;
pub mod pipeline;
pub mod scanner;

#[cfg(test)]
mod test_support;

pub use engine::{DiscoveryEngine, DiscoveryReport, EngineSettings, Stage};
pub use partition::{Leaf, LeafKind, PartitionConfig, PartitionOutcome, PartitionSummary, RangePartitioner};
pub use pipeline::{CandidatePipeline, PipelineReport, PipelineStats};
pub use scanner::RepositoryScanner;

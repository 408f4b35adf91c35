//! Core types and shared functionality for hakken.
//!
//! This crate provides:
//! - Domain model (search ranges, candidates, validated records)
//! - Series document schema validation
//! - Dedup cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod schema;

pub use cache::{CacheRecord, CacheStats, DedupCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::{Candidate, Chapter, OriginKind, RepositoryCoordinate, SearchRange, ValidatedRecord};
pub use schema::{SchemaError, SeriesDocument, validate_series};

//! SQLite-backed dedup cache of classification verdicts.
//!
//! This module provides a persistent, content-addressed cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Verdicts keyed by git blob digest, upserted last-writer-wins
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//!
//! Rows are never deleted here; retention is left to whoever owns the file.

pub mod connection;
pub mod migrations;
pub mod verdicts;

pub use crate::Error;

pub use connection::DedupCache;
pub use verdicts::{CacheRecord, CacheStats};

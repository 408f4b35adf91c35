//! Validated series records handed to the persistence collaborator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OriginKind, RepositoryCoordinate};
use crate::schema::SeriesDocument;

/// One chapter that carries at least one non-blank group link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub volume: String,
    /// Group name to reader URL.
    pub groups: BTreeMap<String, String>,
}

/// A schema-conformant series discovered during a run.
///
/// `chapter_count` counts the chapters that passed validation, which is
/// always `chapters.len()`; malformed raw entries are not counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub title: String,
    pub description: String,
    pub artist: String,
    pub author: String,
    pub cover_url: String,
    pub source_url: String,
    /// `owner/name`, or `unknown` when the source URL has no repository shape.
    pub repository_name: String,
    pub origin: OriginKind,
    pub observed_at: DateTime<Utc>,
    pub chapter_count: usize,
    pub chapters: BTreeMap<String, Chapter>,
    pub quality_score: u32,
}

impl ValidatedRecord {
    pub fn from_document(
        document: SeriesDocument, source_url: impl Into<String>, origin: OriginKind, observed_at: DateTime<Utc>,
    ) -> Self {
        let source_url = source_url.into();
        let repository_name = RepositoryCoordinate::from_content_url(&source_url)
            .map(|repo| repo.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let quality_score = quality_score(&document.cover);

        Self {
            title: document.title,
            description: document.description,
            artist: document.artist,
            author: document.author,
            cover_url: document.cover,
            source_url,
            repository_name,
            origin,
            observed_at,
            chapter_count: document.chapters.len(),
            chapters: document.chapters,
            quality_score,
        }
    }

    /// Attribute the record to a known repository instead of the one read
    /// off the source URL.
    pub fn with_repository(mut self, repository: &RepositoryCoordinate) -> Self {
        self.repository_name = repository.to_string();
        self
    }

    /// Repository hosting the source file, if one is known.
    pub fn repository(&self) -> Option<RepositoryCoordinate> {
        RepositoryCoordinate::parse(&self.repository_name)
    }
}

/// Auxiliary ranking signal; not used for filtering.
fn quality_score(cover: &str) -> u32 {
    match url::Url::parse(cover) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => 1,
        _ => 0,
    }
}

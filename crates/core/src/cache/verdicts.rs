//! Classification verdicts keyed by content digest.

use super::connection::DedupCache;
use crate::Error;
use crate::model::OriginKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, types::Type};

/// The last verdict reached for one blob digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub digest: String,
    pub content_url: String,
    pub last_checked: DateTime<Utc>,
    pub is_valid: bool,
    pub origin: OriginKind,
}

/// Row counts by verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
}

impl DedupCache {
    /// Record a verdict for a digest.
    ///
    /// Uses UPSERT semantics: one row per digest, the latest call wins.
    pub async fn save_result(
        &self, digest: &str, content_url: &str, is_valid: bool, origin: OriginKind,
    ) -> Result<(), Error> {
        let digest = digest.to_string();
        let content_url = content_url.to_string();
        let checked_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO finder_cache (digest, content_url, last_checked, is_valid, origin_kind)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(digest) DO UPDATE SET
                        content_url = excluded.content_url,
                        last_checked = excluded.last_checked,
                        is_valid = excluded.is_valid",
                    params![digest, content_url, checked_at, is_valid as i32, origin.as_str()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the stored verdict for a digest.
    ///
    /// Returns None if the digest has never been classified.
    pub async fn verdict(&self, digest: &str) -> Result<Option<CacheRecord>, Error> {
        let digest = digest.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT digest, content_url, last_checked, is_valid, origin_kind
                    FROM finder_cache WHERE digest = ?1",
                )?;

                let result = stmt.query_row(params![digest], |row| {
                    let last_checked: String = row.get(2)?;
                    let origin: String = row.get(4)?;
                    Ok(CacheRecord {
                        digest: row.get(0)?,
                        content_url: row.get(1)?,
                        last_checked: DateTime::parse_from_rfc3339(&last_checked)
                            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
                            .with_timezone(&Utc),
                        is_valid: row.get::<_, i32>(3)? == 1,
                        origin: origin
                            .parse()
                            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
                    })
                });

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a digest has any stored verdict.
    pub async fn is_cached(&self, digest: &str) -> Result<bool, Error> {
        let digest = digest.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let cached: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM finder_cache WHERE digest = ?1)",
                        params![digest],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;
                Ok(cached)
            })
            .await
            .map_err(Error::from)
    }

    /// Count rows by verdict.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        self.conn
            .call(|conn| -> Result<CacheStats, Error> {
                let (total, valid): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(is_valid), 0) FROM finder_cache",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(CacheStats { total: total as u64, valid: valid as u64, invalid: (total - valid) as u64 })
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://raw.githubusercontent.com/alice/series/HEAD/one.json";

    #[tokio::test]
    async fn test_save_then_cached() {
        let cache = DedupCache::open_in_memory().await.unwrap();
        assert!(!cache.is_cached("d1").await.unwrap());

        cache.save_result("d1", URL, true, OriginKind::Search).await.unwrap();

        assert!(cache.is_cached("d1").await.unwrap());
        let record = cache.verdict("d1").await.unwrap().unwrap();
        assert!(record.is_valid);
        assert_eq!(record.content_url, URL);
        assert_eq!(record.origin, OriginKind::Search);
    }

    #[tokio::test]
    async fn test_verdict_update_keeps_single_row() {
        let cache = DedupCache::open_in_memory().await.unwrap();
        cache.save_result("d1", URL, true, OriginKind::Search).await.unwrap();
        let first = cache.verdict("d1").await.unwrap().unwrap();

        cache.save_result("d1", URL, false, OriginKind::RepoScan).await.unwrap();

        let record = cache.verdict("d1").await.unwrap().unwrap();
        assert!(!record.is_valid);
        assert!(record.last_checked >= first.last_checked);
        // the origin of the first sighting is kept
        assert_eq!(record.origin, OriginKind::Search);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats, CacheStats { total: 1, valid: 0, invalid: 1 });
    }

    #[tokio::test]
    async fn test_verdict_missing() {
        let cache = DedupCache::open_in_memory().await.unwrap();
        assert!(cache.verdict("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_upserts() {
        let cache = DedupCache::open_in_memory().await.unwrap();
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let cache = cache.clone();
            tasks.spawn(async move {
                let digest = format!("d{}", i % 8);
                cache.save_result(&digest, URL, i % 2 == 0, OriginKind::RepoScan).await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total, 8);
        assert_eq!(stats.valid + stats.invalid, 8);
    }
}

//! Schema setup for the dedup cache.
//!
//! `schema_version` records the highest schema applied to a file, so an
//! existing cache is opened without touching its rows.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// The verdict table and its lookup indexes.
const SCHEMA: Schema = Schema { version: 1, sql: include_str!("../../migrations/001_finder_cache.sql") };

#[derive(Clone, Copy)]
struct Schema {
    version: i64,
    sql: &'static str,
}

/// Bring the cache schema up to date.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    apply(conn, SCHEMA).await
}

async fn apply(conn: &Connection, schema: Schema) -> Result<(), Error> {
    conn.call(move |conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))?;
        if current >= schema.version {
            return Ok(());
        }

        tracing::debug!(from = current, to = schema.version, "upgrading cache schema");
        let tx = conn.transaction()?;
        tx.execute_batch(schema.sql)
            .map_err(|e: rusqlite::Error| Error::MigrationFailed(format!("version {}: {e}", schema.version)))?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![schema.version, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
    .map_err(Error::from)
}

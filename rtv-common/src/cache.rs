//! Persistent payload cache
//!
//! Stores the raw compressed tree payload keyed by source URL, so the
//! download happens at most once per URL. There is deliberately no TTL:
//! payloads are immutable once published, and the semantics are
//! download-once-then-cache-forever. `evict` exists for manual
//! invalidation only.

use crate::Result;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

/// SQLite-backed byte cache for compressed tree payloads
pub struct PayloadCache {
    pool: SqlitePool,
}

impl PayloadCache {
    /// Open the cache database at `db_path`, creating it and its schema if
    /// needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new payload cache: {}", db_path.display());
        } else {
            info!("Opened existing payload cache: {}", db_path.display());
        }

        // WAL mode allows a reader while a download is being stored
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tree_payloads (
                url TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                fetched_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Look up a cached payload by source URL
    pub async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT payload FROM tree_payloads WHERE url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((payload,)) => {
                debug!("Payload cache hit: {} ({} bytes)", url, payload.len());
                Ok(Some(payload))
            }
            None => {
                debug!("Payload cache miss: {}", url);
                Ok(None)
            }
        }
    }

    /// Store a payload, replacing any previous entry for the URL
    pub async fn put(&self, url: &str, payload: &[u8]) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO tree_payloads (url, payload, fetched_at)
             VALUES (?, ?, ?)",
        )
        .bind(url)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Payload cached: {} ({} bytes)", url, payload.len());
        Ok(())
    }

    /// Drop a cached payload; returns whether an entry existed
    pub async fn evict(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tree_payloads WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

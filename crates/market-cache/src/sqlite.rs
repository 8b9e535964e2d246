//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::Utc;
use market_core::{CacheStore, MarketError, Result, Ttl};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-backed store.
///
/// Entries live in one `cache_entries` table and survive restarts when the
/// store is opened on a file. Deadlines are wall-clock milliseconds since the
/// Unix epoch; `NULL` means the entry never expires.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| MarketError::Cache(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| MarketError::Cache(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER,
                written_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| MarketError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at
             ON cache_entries(expires_at)",
            [],
        )
        .map_err(|e| MarketError::Cache(e.to_string()))?;

        Ok(())
    }

    fn write(&self, key: &str, value: &str, expires_at: Option<i64>) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, expires_at, written_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, value, expires_at, Utc::now().to_rfc3339()],
        )
        .map_err(|e| MarketError::Cache(e.to_string()))?;
        Ok(())
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl CacheStore for SqliteStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_entries
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now_millis()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| MarketError::Cache(e.to_string()))?;

        debug!(hit = value.is_some(), "Cache lookup");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str, ttl: Ttl) -> Result<()> {
        let expires_at = ttl
            .duration()
            .map(|d| now_millis().saturating_add(i64::try_from(d.as_millis()).unwrap_or(i64::MAX)));
        self.write(key, value, expires_at)?;
        debug!(?ttl, "Cached value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        let removed = conn
            .execute(
                "DELETE FROM cache_entries
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now_millis()],
            )
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        // An expired row for the same key is dead weight either way.
        conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        let purged = conn
            .execute(
                "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now_millis()],
            )
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        debug!(purged, "Purged expired entries");
        Ok(purged)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        conn.execute("DELETE FROM cache_entries", [])
            .map_err(|e| MarketError::Cache(e.to_string()))?;
        Ok(())
    }
}

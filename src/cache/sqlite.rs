//! SQLite-based metadata cache.
//!
//! Provides persistent caching of derived metadata so that separate
//! processes sharing the file read the catalog once. The default location is
//! `~/.relmeta/cache.db`.
//!
//! # Design
//!
//! - Simple key-value store with JSON values
//! - No TTL - cache persists until manually cleared
//! - Versioned - auto-clears on version mismatch

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{CacheError, CacheResult, CacheStore};

/// Current cache schema version. Bump this when the cache format changes.
const CACHE_VERSION: i32 = 1;

/// SQLite-based metadata cache.
pub struct MetadataCache {
    conn: Mutex<Connection>,
}

impl MetadataCache {
    /// Open or create the cache database at the default location.
    pub fn open() -> CacheResult<Self> {
        Self::open_at(Self::cache_path()?)
    }

    /// Open or create the cache database at `path`.
    ///
    /// If the cache version doesn't match, it's automatically cleared.
    pub fn open_at(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Get the default path of the cache database.
    pub fn cache_path() -> CacheResult<PathBuf> {
        let base = dirs::home_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join(".relmeta").join("cache.db"))
    }

    fn from_connection(conn: Connection) -> CacheResult<Self> {
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init()?;
        Ok(cache)
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Initialize the cache schema and check version.
    fn init(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == CACHE_VERSION => {}
            Some(v) => {
                tracing::info!(
                    stored = v,
                    current = CACHE_VERSION,
                    "cache version changed, clearing entries"
                );
                conn.execute("DELETE FROM cache", [])?;
                Self::set_version(&conn)?;
            }
            None => Self::set_version(&conn)?,
        }

        Ok(())
    }

    fn set_version(conn: &Connection) -> CacheResult<()> {
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![CACHE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        let rows = self
            .lock()?
            .execute("DELETE FROM cache WHERE key = ?", params![key])?;
        Ok(rows > 0)
    }

    /// Delete all entries matching a key prefix, e.g. one connection's
    /// namespace.
    pub fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let pattern = format!("{}%", escape_like(prefix));
        let rows = self.lock()?.execute(
            "DELETE FROM cache WHERE key LIKE ? ESCAPE '\\'",
            params![pattern],
        )?;
        Ok(rows)
    }

    /// Clear all cache entries (but keep metadata).
    pub fn clear_all(&self) -> CacheResult<()> {
        self.lock()?.execute("DELETE FROM cache", [])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let conn = self.lock()?;
        let entry_count: i64 = conn.query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))?;

        let total_size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(value)), 0) FROM cache",
            [],
            |row| row.get(0),
        )?;

        Ok(CacheStats {
            entry_count: entry_count as usize,
            total_size_bytes: total_size as usize,
        })
    }
}

impl CacheStore for MetadataCache {
    fn contains(&self, key: &str) -> CacheResult<bool> {
        let found: Option<i64> = self
            .lock()?
            .query_row("SELECT 1 FROM cache WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Stored text that is not valid JSON surfaces as [`CacheError::Json`].
    fn fetch(&self, key: &str) -> CacheResult<Option<Value>> {
        let json: Option<String> = self
            .lock()?
            .query_row(
                "SELECT value FROM cache WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &Value) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO cache (key, value) VALUES (?, ?)",
            params![key, json],
        )?;
        Ok(())
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entries in the cache.
    pub entry_count: usize,
    /// Total size of all values in bytes.
    pub total_size_bytes: usize,
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

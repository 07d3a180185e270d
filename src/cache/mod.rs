//! Cache stores for derived schema metadata.
//!
//! The analyzer reads and writes opaque JSON values through the
//! [`CacheStore`] trait. Two stores are bundled:
//!
//! - [`MetadataCache`]: SQLite-backed, persists across processes
//! - [`MemoryCache`]: process-local
//!
//! # Key Format
//!
//! ```text
//! {namespace}_immutable_schema            -> Schema
//! {namespace}_pivottables_link_{table}    -> ["junction_table", ...]
//! ```
//!
//! There is no TTL and no invalidation: entries live until the store is
//! cleared.

mod hash;
mod memory;
mod sqlite;

pub use hash::hash_str;
pub use memory::MemoryCache;
pub use sqlite::{CacheStats, MetadataCache};

use serde_json::Value;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache connection lock poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store shared by analyzers.
///
/// Implementations must be safe to share between threads. Concurrent writers
/// of the same key are expected: they write equivalent values.
pub trait CacheStore: Send + Sync {
    /// Check whether a value is stored under `key`.
    fn contains(&self, key: &str) -> CacheResult<bool>;

    /// Fetch the value stored under `key`.
    ///
    /// A value the store cannot decode as JSON is an error, not a miss. Only
    /// decoded values of the wrong shape are treated as misses by callers.
    fn fetch(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &Value) -> CacheResult<()>;
}

/// Helper for generating cache keys.
pub struct CacheKey;

impl CacheKey {
    /// Namespace for a connection: a hash of its identity fields.
    pub fn namespace(host: &str, port: &str, database: &str, driver: &str) -> String {
        hash_str(&format!("{}-{}-{}-{}", host, port, database, driver))
    }

    /// Key for the normalized schema snapshot.
    pub fn schema(namespace: &str) -> String {
        format!("{}_immutable_schema", namespace)
    }

    /// Key for the pivot tables linked to a table.
    pub fn pivot_tables(namespace: &str, table: &str) -> String {
        format!("{}_pivottables_link_{}", namespace, table)
    }
}

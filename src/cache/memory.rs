//! Process-local cache store.

use dashmap::DashMap;
use serde_json::Value;

use super::{CacheResult, CacheStore};

/// In-memory [`CacheStore`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl CacheStore for MemoryCache {
    fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn fetch(&self, key: &str) -> CacheResult<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn save(&self, key: &str, value: &Value) -> CacheResult<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

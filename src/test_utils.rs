//! Test doubles for the analyzer's collaborators.
//!
//! Each double counts how often it is used so tests can assert on catalog
//! reads and cache traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::{CacheResult, CacheStore, MemoryCache};
use crate::catalog::{CatalogReader, CatalogResult, ConnectionIdentity};
use crate::config::ConnectionError;
use crate::detector::RelationshipDetector;
use crate::schema::{ForeignKey, Schema, Table};

/// Fixed connection identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    pub host: String,
    pub port: String,
    pub database: String,
    pub driver: String,
}

impl StaticIdentity {
    pub fn new(host: &str, port: &str, database: &str, driver: &str) -> Self {
        Self {
            host: host.to_string(),
            port: port.to_string(),
            database: database.to_string(),
            driver: driver.to_string(),
        }
    }
}

impl ConnectionIdentity for StaticIdentity {
    fn host(&self) -> Result<String, ConnectionError> {
        Ok(self.host.clone())
    }

    fn port(&self) -> Result<String, ConnectionError> {
        Ok(self.port.clone())
    }

    fn database_name(&self) -> Result<String, ConnectionError> {
        Ok(self.database.clone())
    }

    fn driver_name(&self) -> Result<String, ConnectionError> {
        Ok(self.driver.clone())
    }
}

/// Identity of a connection that was never established.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedIdentity;

impl ConnectionIdentity for DisconnectedIdentity {
    fn host(&self) -> Result<String, ConnectionError> {
        Err(ConnectionError::NotConnected("no host".to_string()))
    }

    fn port(&self) -> Result<String, ConnectionError> {
        Err(ConnectionError::NotConnected("no port".to_string()))
    }

    fn database_name(&self) -> Result<String, ConnectionError> {
        Err(ConnectionError::NotConnected("no database".to_string()))
    }

    fn driver_name(&self) -> Result<String, ConnectionError> {
        Err(ConnectionError::NotConnected("no driver".to_string()))
    }
}

/// Catalog reader returning a fixed schema and counting reads.
#[derive(Debug, Default)]
pub struct CountingCatalog {
    schema: Schema,
    reads: AtomicUsize,
}

impl CountingCatalog {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogReader for CountingCatalog {
    async fn read_schema(&self) -> CatalogResult<Schema> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to race.
        tokio::task::yield_now().await;
        Ok(self.schema.clone())
    }
}

/// In-memory cache store counting fetches and saves.
#[derive(Debug, Default)]
pub struct CountingCache {
    inner: MemoryCache,
    fetches: AtomicUsize,
    saves: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CacheStore for CountingCache {
    fn contains(&self, key: &str) -> CacheResult<bool> {
        self.inner.contains(key)
    }

    fn fetch(&self, key: &str) -> CacheResult<Option<Value>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(key)
    }

    fn save(&self, key: &str, value: &Value) -> CacheResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(key, value)
    }
}

/// Detector with preconfigured answers.
///
/// Junction tables are named and looked up in the schema passed in; child
/// relationships are returned as configured.
#[derive(Debug, Default)]
pub struct FixedDetector {
    junction_tables: Vec<String>,
    children: HashMap<String, Vec<ForeignKey>>,
    junction_calls: AtomicUsize,
}

impl FixedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_junction_table(mut self, name: &str) -> Self {
        self.junction_tables.push(name.to_string());
        self
    }

    pub fn with_child_relationship(mut self, parent: &str, fk: ForeignKey) -> Self {
        self.children.entry(parent.to_string()).or_default().push(fk);
        self
    }

    /// Number of junction table requests served.
    pub fn junction_calls(&self) -> usize {
        self.junction_calls.load(Ordering::SeqCst)
    }
}

impl RelationshipDetector for FixedDetector {
    fn junction_tables(&self, schema: &Schema, _ignore_referenced_tables: bool) -> Vec<Table> {
        self.junction_calls.fetch_add(1, Ordering::SeqCst);
        self.junction_tables
            .iter()
            .filter_map(|name| schema.get_table(name).cloned())
            .collect()
    }

    fn child_relationships(&self, _schema: &Schema, table_name: &str) -> Vec<ForeignKey> {
        self.children.get(table_name).cloned().unwrap_or_default()
    }
}

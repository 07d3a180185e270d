//! Schema analyzer.
//!
//! [`SchemaAnalyzer`] owns the cached snapshot for one connection and answers
//! relationship questions about it.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        SchemaAnalyzer                         │
//! │  cache_namespace()   schema()   pivot_tables_referencing()    │
//! │                                 incoming_foreign_keys()       │
//! └───────────────────────────────────────────────────────────────┘
//!       │                  │                 │              │
//!       ▼                  ▼                 ▼              ▼
//!  ConnectionIdentity  CatalogReader     CacheStore   RelationshipDetector
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relmeta::{MetadataCache, SchemaAnalyzer, SqliteCatalogReader};
//!
//! let reader = Arc::new(SqliteCatalogReader::open("./app.db")?);
//! let analyzer = SchemaAnalyzer::sqlite(reader, Arc::new(MetadataCache::open()?));
//!
//! let pivots = analyzer.pivot_tables_referencing("users").await?;
//! let incoming = analyzer.incoming_foreign_keys("users").await?;
//! ```

mod error;
mod relationships;

pub use error::{AnalyzerError, AnalyzerResult};
pub use relationships::{
    classify_incoming, dedupe_foreign_keys, local_column_signature, pivot_tables_for,
};

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheKey, CacheStore};
use crate::catalog::{CatalogReader, ConnectionIdentity, SqliteCatalogReader};
use crate::detector::{RelationshipDetector, StructuralDetector};
use crate::schema::{normalize_temporal_types, ForeignKey, Schema};

/// Derives and caches relationship metadata for one database connection.
///
/// The namespace and the snapshot are computed at most once per instance,
/// even when first requested concurrently. The instance is `Send + Sync`
/// and is meant to be shared behind an `Arc`.
pub struct SchemaAnalyzer {
    identity: Arc<dyn ConnectionIdentity>,
    catalog: Arc<dyn CatalogReader>,
    cache: Arc<dyn CacheStore>,
    detector: Arc<dyn RelationshipDetector>,
    namespace: once_cell::sync::OnceCell<String>,
    schema: tokio::sync::OnceCell<Arc<Schema>>,
}

impl SchemaAnalyzer {
    pub fn new(
        identity: Arc<dyn ConnectionIdentity>,
        catalog: Arc<dyn CatalogReader>,
        cache: Arc<dyn CacheStore>,
        detector: Arc<dyn RelationshipDetector>,
    ) -> Self {
        Self {
            identity,
            catalog,
            cache,
            detector,
            namespace: once_cell::sync::OnceCell::new(),
            schema: tokio::sync::OnceCell::new(),
        }
    }

    /// Analyzer over a SQLite database using [`StructuralDetector`].
    pub fn sqlite(reader: Arc<SqliteCatalogReader>, cache: Arc<dyn CacheStore>) -> Self {
        Self::new(
            reader.clone(),
            reader,
            cache,
            Arc::new(StructuralDetector::new()),
        )
    }

    /// Unique namespace for this connection's cache entries.
    ///
    /// A hash of host, port, database name and driver name.
    pub fn cache_namespace(&self) -> AnalyzerResult<&str> {
        let namespace = self.namespace.get_or_try_init(|| {
            Ok::<_, AnalyzerError>(CacheKey::namespace(
                &self.identity.host()?,
                &self.identity.port()?,
                &self.identity.database_name()?,
                &self.identity.driver_name()?,
            ))
        })?;
        Ok(namespace.as_str())
    }

    /// The normalized schema snapshot.
    ///
    /// Adopted from the cache store when present there; otherwise read from
    /// the catalog, normalized and stored.
    pub async fn schema(&self) -> AnalyzerResult<Arc<Schema>> {
        self.schema
            .get_or_try_init(|| self.load_schema())
            .await
            .cloned()
    }

    async fn load_schema(&self) -> AnalyzerResult<Arc<Schema>> {
        let key = CacheKey::schema(self.cache_namespace()?);

        if let Some(value) = self.cache.fetch(&key)? {
            match serde_json::from_value::<Schema>(value) {
                Ok(schema) => {
                    tracing::debug!(%key, tables = schema.tables.len(), "schema cache hit");
                    return Ok(Arc::new(schema));
                }
                Err(err) => {
                    tracing::warn!(%key, error = %err, "unreadable cached schema, reloading");
                }
            }
        }

        let mut schema = self.catalog.read_schema().await?;
        let rewritten = normalize_temporal_types(&mut schema);
        tracing::info!(
            %key,
            tables = schema.tables.len(),
            temporal_columns = rewritten,
            "loaded schema from catalog"
        );

        self.cache.save(&key, &serde_json::to_value(&schema)?)?;
        Ok(Arc::new(schema))
    }

    /// Names of junction tables holding a foreign key to `table_name`.
    ///
    /// Order follows the detector's junction table order. The result is
    /// cached per table, including when it is empty.
    pub async fn pivot_tables_referencing(&self, table_name: &str) -> AnalyzerResult<Vec<String>> {
        let key = CacheKey::pivot_tables(self.cache_namespace()?, table_name);

        if let Some(value) = self.cache.fetch(&key)? {
            match string_array(&value) {
                Some(tables) => {
                    tracing::debug!(%key, "pivot table cache hit");
                    return Ok(tables);
                }
                None => tracing::warn!(%key, "cached pivot tables are not a string array"),
            }
        }

        let schema = self.schema().await?;
        let junction_tables = self.detector.junction_tables(&schema, true);
        let pivot_tables = pivot_tables_for(junction_tables.iter(), table_name);

        self.cache.save(&key, &serde_json::to_value(&pivot_tables)?)?;
        tracing::debug!(table = table_name, count = pivot_tables.len(), "pivot tables resolved");
        Ok(pivot_tables)
    }

    /// Foreign keys from other tables pointing at `table_name`.
    ///
    /// Keys declared by junction tables and keys expressing inheritance from
    /// `table_name` are left out, and keys sharing a local table and local
    /// columns are reported once.
    pub async fn incoming_foreign_keys(&self, table_name: &str) -> AnalyzerResult<Vec<ForeignKey>> {
        let schema = self.schema().await?;

        let junction_tables = self.detector.junction_tables(&schema, true);
        let junction_table_names: HashSet<&str> =
            junction_tables.iter().map(|t| t.name.as_str()).collect();
        let children = self.detector.child_relationships(&schema, table_name);

        let incoming: Vec<ForeignKey> =
            classify_incoming(&schema, table_name, &junction_table_names, &children)
                .into_iter()
                .cloned()
                .collect();

        tracing::debug!(table = table_name, count = incoming.len(), "incoming foreign keys");
        Ok(incoming)
    }
}

/// Decode a cached pivot table list; anything but an array of strings is
/// rejected.
fn string_array(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

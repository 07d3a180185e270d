//! Integration tests for loading, normalizing and caching the schema snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use relmeta::cache::{CacheError, CacheResult};
use relmeta::catalog::{CatalogError, CatalogResult};
use relmeta::test_utils::{CountingCache, CountingCatalog, FixedDetector, StaticIdentity};
use relmeta::{
    AnalyzerError, CacheKey, CacheStore, CatalogReader, Column, ColumnType, ForeignKey, Schema,
    SchemaAnalyzer, Table,
};

fn sample_schema() -> Schema {
    Schema::new(vec![
        Table::new("customers")
            .with_column(Column::new("id", ColumnType::Integer).autoincrement())
            .with_column(Column::new("born_on", ColumnType::Date))
            .with_column(Column::new("created_at", ColumnType::DateTime))
            .with_primary_key(["id"]),
        Table::new("orders")
            .with_column(Column::new("id", ColumnType::Integer).autoincrement())
            .with_column(Column::new("customer_id", ColumnType::Integer))
            .with_column(Column::new("placed_at", ColumnType::DateTimeTz))
            .with_column(Column::new("cutoff", ColumnType::Time))
            .with_primary_key(["id"])
            .with_foreign_key(ForeignKey::new(
                "fk_orders_customer",
                "orders",
                ["customer_id"],
                "customers",
                ["id"],
            )),
    ])
}

fn identity() -> Arc<StaticIdentity> {
    Arc::new(StaticIdentity::new("localhost", "5432", "shop", "postgres"))
}

fn analyzer(catalog: Arc<dyn CatalogReader>, cache: Arc<dyn CacheStore>) -> SchemaAnalyzer {
    SchemaAnalyzer::new(identity(), catalog, cache, Arc::new(FixedDetector::new()))
}

fn schema_key() -> String {
    CacheKey::schema(&CacheKey::namespace("localhost", "5432", "shop", "postgres"))
}

#[tokio::test]
async fn test_first_call_reads_catalog_once_and_saves_once() {
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let cache = Arc::new(CountingCache::new());
    let analyzer = analyzer(catalog.clone(), cache.clone());

    analyzer.schema().await.unwrap();
    assert_eq!(catalog.reads(), 1);
    assert_eq!(cache.saves(), 1);
    assert!(cache.contains(&schema_key()).unwrap());

    analyzer.schema().await.unwrap();
    assert_eq!(catalog.reads(), 1);
    assert_eq!(cache.saves(), 1);
    // Second call is served from the instance without touching the store.
    assert_eq!(cache.fetches(), 1);
}

#[tokio::test]
async fn test_new_instance_adopts_cached_schema() {
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let cache = Arc::new(CountingCache::new());

    let first = analyzer(catalog.clone(), cache.clone()).schema().await.unwrap();
    let second = analyzer(catalog.clone(), cache.clone()).schema().await.unwrap();

    assert_eq!(catalog.reads(), 1);
    assert_eq!(cache.saves(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_schema_is_normalized_before_caching() {
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let cache = Arc::new(CountingCache::new());
    let analyzer = analyzer(catalog, cache.clone());

    let schema = analyzer.schema().await.unwrap();
    let types: Vec<ColumnType> = schema
        .tables
        .iter()
        .flat_map(|t| t.columns.iter().map(|c| c.column_type))
        .collect();

    assert_eq!(
        types,
        vec![
            ColumnType::Integer,
            ColumnType::DateImmutable,
            ColumnType::DateTimeImmutable,
            ColumnType::Integer,
            ColumnType::Integer,
            ColumnType::DateTimeTzImmutable,
            ColumnType::TimeImmutable,
        ]
    );

    let stored = cache.fetch(&schema_key()).unwrap().unwrap();
    let stored: Schema = serde_json::from_value(stored).unwrap();
    assert_eq!(&stored, schema.as_ref());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_share_one_read() {
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let cache = Arc::new(CountingCache::new());
    let analyzer = Arc::new(analyzer(catalog.clone(), cache.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let analyzer = analyzer.clone();
            tokio::spawn(async move { analyzer.schema().await.map(|s| s.tables.len()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    assert_eq!(catalog.reads(), 1);
    assert_eq!(cache.saves(), 1);
}

#[tokio::test]
async fn test_unreadable_cached_schema_is_a_miss() {
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let cache = Arc::new(CountingCache::new());
    cache.save(&schema_key(), &json!("stale blob")).unwrap();

    let schema = analyzer(catalog.clone(), cache.clone()).schema().await.unwrap();

    assert_eq!(catalog.reads(), 1);
    assert_eq!(schema.tables.len(), 2);
    let stored = cache.fetch(&schema_key()).unwrap().unwrap();
    assert!(stored.is_object());
}

struct FailingCatalog;

#[async_trait]
impl CatalogReader for FailingCatalog {
    async fn read_schema(&self) -> CatalogResult<Schema> {
        Err(CatalogError::Introspection {
            table: "orders".to_string(),
            message: "permission denied".to_string(),
        })
    }
}

struct FailingCache;

impl CacheStore for FailingCache {
    fn contains(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::NoCacheDir)
    }

    fn fetch(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(CacheError::NoCacheDir)
    }

    fn save(&self, _key: &str, _value: &Value) -> CacheResult<()> {
        Err(CacheError::NoCacheDir)
    }
}

#[tokio::test]
async fn test_catalog_error_propagates() {
    let cache = Arc::new(CountingCache::new());
    let analyzer = analyzer(Arc::new(FailingCatalog), cache.clone());

    let err = analyzer.schema().await.unwrap_err();

    assert!(matches!(
        err,
        AnalyzerError::Catalog(CatalogError::Introspection { .. })
    ));
    assert_eq!(cache.saves(), 0);
}

#[tokio::test]
async fn test_cache_error_is_not_treated_as_miss() {
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let analyzer = analyzer(catalog.clone(), Arc::new(FailingCache));

    let err = analyzer.schema().await.unwrap_err();

    assert!(matches!(err, AnalyzerError::Cache(CacheError::NoCacheDir)));
    assert_eq!(catalog.reads(), 0);
}

#[tokio::test]
async fn test_failed_load_is_retried_on_next_call() {
    let cache = Arc::new(CountingCache::new());
    let failing = analyzer(Arc::new(FailingCatalog), cache.clone());
    assert!(failing.schema().await.is_err());
    assert!(failing.schema().await.is_err());

    let catalog = Arc::new(CountingCatalog::new(sample_schema()));
    let working = analyzer(catalog.clone(), cache.clone());
    assert!(working.schema().await.is_ok());
    assert_eq!(catalog.reads(), 1);
}

#[tokio::test]
async fn test_connections_do_not_share_entries() {
    let cache = Arc::new(CountingCache::new());
    let catalog = Arc::new(CountingCatalog::new(sample_schema()));

    let primary = analyzer(catalog.clone(), cache.clone());
    let replica = SchemaAnalyzer::new(
        Arc::new(StaticIdentity::new("localhost", "5433", "shop", "postgres")),
        catalog.clone(),
        cache.clone(),
        Arc::new(FixedDetector::new()),
    );

    primary.schema().await.unwrap();
    replica.schema().await.unwrap();

    assert_eq!(catalog.reads(), 2);
    assert_ne!(
        primary.cache_namespace().unwrap(),
        replica.cache_namespace().unwrap()
    );
}

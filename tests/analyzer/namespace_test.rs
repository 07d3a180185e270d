//! Integration tests for the per-connection cache namespace.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use relmeta::config::ConnectionError;
use relmeta::test_utils::{
    CountingCache, CountingCatalog, DisconnectedIdentity, FixedDetector, StaticIdentity,
};
use relmeta::{AnalyzerError, ConnectionIdentity, Schema, SchemaAnalyzer};

fn analyzer(identity: Arc<dyn ConnectionIdentity>) -> SchemaAnalyzer {
    SchemaAnalyzer::new(
        identity,
        Arc::new(CountingCatalog::new(Schema::default())),
        Arc::new(CountingCache::new()),
        Arc::new(FixedDetector::new()),
    )
}

fn namespace_of(host: &str, port: &str, database: &str, driver: &str) -> String {
    analyzer(Arc::new(StaticIdentity::new(host, port, database, driver)))
        .cache_namespace()
        .unwrap()
        .to_string()
}

/// Identity that counts how often its host is requested.
#[derive(Default)]
struct CountingIdentity {
    host_calls: AtomicUsize,
}

impl ConnectionIdentity for CountingIdentity {
    fn host(&self) -> Result<String, ConnectionError> {
        self.host_calls.fetch_add(1, Ordering::SeqCst);
        Ok("localhost".to_string())
    }

    fn port(&self) -> Result<String, ConnectionError> {
        Ok("5432".to_string())
    }

    fn database_name(&self) -> Result<String, ConnectionError> {
        Ok("app".to_string())
    }

    fn driver_name(&self) -> Result<String, ConnectionError> {
        Ok("postgres".to_string())
    }
}

#[test]
fn test_namespace_is_stable_within_instance() {
    let identity = StaticIdentity::new("localhost", "5432", "app", "postgres");
    let analyzer = analyzer(Arc::new(identity));

    let first = analyzer.cache_namespace().unwrap().to_string();
    let second = analyzer.cache_namespace().unwrap().to_string();

    assert_eq!(first, second);
}

#[test]
fn test_namespace_is_computed_once() {
    let identity = Arc::new(CountingIdentity::default());
    let analyzer = analyzer(identity.clone());

    for _ in 0..5 {
        analyzer.cache_namespace().unwrap();
    }

    assert_eq!(identity.host_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_namespace_matches_across_instances() {
    assert_eq!(
        namespace_of("localhost", "5432", "app", "postgres"),
        namespace_of("localhost", "5432", "app", "postgres")
    );
}

#[test]
fn test_namespace_differs_per_identity_field() {
    let base = namespace_of("localhost", "5432", "app", "postgres");

    assert_ne!(base, namespace_of("db.internal", "5432", "app", "postgres"));
    assert_ne!(base, namespace_of("localhost", "5433", "app", "postgres"));
    assert_ne!(base, namespace_of("localhost", "5432", "billing", "postgres"));
    assert_ne!(base, namespace_of("localhost", "5432", "app", "mysql"));
}

#[test]
fn test_namespace_is_sha256_of_joined_identity() {
    let namespace = namespace_of("localhost", "5432", "app", "postgres");
    insta::assert_snapshot!(namespace, @"baf0fb0e85f222e882c3f38ec92e84cdd010febd910b5b5beb66db86d98333ea");
}

#[test]
fn test_identity_failure_propagates() {
    let analyzer = analyzer(Arc::new(DisconnectedIdentity));

    let err = analyzer.cache_namespace().unwrap_err();
    assert!(matches!(
        err,
        AnalyzerError::Connection(ConnectionError::NotConnected(_))
    ));
}

//! Catalog access.
//!
//! The analyzer reads the live catalog through two collaborator traits:
//!
//! - [`ConnectionIdentity`]: who we are connected to (used for cache keys)
//! - [`CatalogReader`]: produces a fresh [`Schema`] snapshot on demand
//!
//! [`SqliteCatalogReader`] implements both for SQLite databases.

mod sqlite;

pub use sqlite::SqliteCatalogReader;

use async_trait::async_trait;

use crate::config::ConnectionError;
use crate::schema::Schema;

/// Errors raised while reading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to introspect table {table}: {message}")]
    Introspection { table: String, message: String },

    #[error("catalog connection lock poisoned")]
    Poisoned,

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Identity of the database connection.
///
/// The four fields together scope cache entries to one database. Any of them
/// may fail when the connection is not established.
pub trait ConnectionIdentity: Send + Sync {
    fn host(&self) -> Result<String, ConnectionError>;

    /// Port as text; empty when the driver has no port.
    fn port(&self) -> Result<String, ConnectionError>;

    fn database_name(&self) -> Result<String, ConnectionError>;

    fn driver_name(&self) -> Result<String, ConnectionError>;
}

/// Reads a raw schema snapshot from a live database.
///
/// Every call performs introspection queries; callers cache the result.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Read all tables with their columns, primary keys and foreign keys.
    ///
    /// Temporal columns carry their mutable type kinds.
    async fn read_schema(&self) -> CatalogResult<Schema>;
}

//! # relmeta
//!
//! Relationship metadata derived from a relational database catalog.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          CatalogReader (live introspection)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [normalize temporal types]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Schema snapshot (cached per connection)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [RelationshipDetector]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Pivot tables  /  incoming foreign keys per table      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every cache entry is prefixed with a namespace derived from the
//! connection identity, so several databases can share one [`CacheStore`].

pub mod analyzer;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod detector;
pub mod schema;
pub mod test_utils;

pub use analyzer::{AnalyzerError, AnalyzerResult, SchemaAnalyzer};
pub use cache::{CacheError, CacheKey, CacheStore, MemoryCache, MetadataCache};
pub use catalog::{CatalogError, CatalogReader, ConnectionIdentity, SqliteCatalogReader};
pub use config::{ConnectionConfig, ConnectionError, Driver, Settings};
pub use detector::{RelationshipDetector, StructuralDetector};
pub use schema::{Column, ColumnType, ForeignKey, Schema, Table};

//! Analyzer error type.
//!
//! The analyzer adds no failure modes of its own: every variant wraps the
//! collaborator error unchanged.

use thiserror::Error;

use crate::cache::CacheError;
use crate::catalog::CatalogError;
use crate::config::ConnectionError;

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors surfaced by [`SchemaAnalyzer`](super::SchemaAnalyzer).
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The connection identity could not be determined.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The catalog reader failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The cache store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Cache(CacheError::Json(err))
    }
}

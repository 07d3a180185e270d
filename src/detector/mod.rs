//! Junction table and inheritance detection.
//!
//! A [`RelationshipDetector`] classifies tables and foreign keys of a
//! snapshot. The analyzer treats it as a pure function of the snapshot it is
//! given. [`StructuralDetector`] is the bundled implementation.

mod structural;

pub use structural::StructuralDetector;

use crate::schema::{ForeignKey, Schema, Table};

/// Classifies junction tables and inheritance links in a schema.
pub trait RelationshipDetector: Send + Sync {
    /// Tables whose only purpose is to link two other tables.
    ///
    /// With `ignore_referenced_tables`, a table that is itself the target of a
    /// foreign key is never reported: it carries identity of its own.
    fn junction_tables(&self, schema: &Schema, ignore_referenced_tables: bool) -> Vec<Table>;

    /// Foreign keys expressing that rows of another table are also rows of
    /// `table_name` (single-table inheritance).
    ///
    /// Returned keys are matched structurally (local table and local
    /// columns), so they need not be the snapshot's own instances.
    fn child_relationships(&self, schema: &Schema, table_name: &str) -> Vec<ForeignKey>;
}

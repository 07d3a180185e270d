//! Detection from table shape alone.
//!
//! Junction table rules:
//! - exactly two foreign keys, each over a single column
//! - two columns and no single-column primary key, or
//! - three columns where the primary key is one auto-increment column that
//!   is not a foreign key column
//!
//! A foreign key is an inheritance link when its local columns are exactly
//! the local table's primary key.

use std::collections::HashSet;

use super::RelationshipDetector;
use crate::schema::{ForeignKey, Schema, Table};

/// [`RelationshipDetector`] driven by table structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralDetector;

impl StructuralDetector {
    pub fn new() -> Self {
        Self
    }

    /// Check whether `table` has the shape of a junction table.
    pub fn is_junction_table(&self, table: &Table) -> bool {
        if table.foreign_keys.len() != 2 {
            return false;
        }

        let column_count = table.columns.len();
        if !(2..=3).contains(&column_count) {
            return false;
        }

        let pk_columns = table.primary_key_columns();
        match (pk_columns.len(), column_count) {
            (1, 2) => return false,
            (n, 3) if n != 1 => return false,
            _ => {}
        }

        let mut fk_columns = HashSet::new();
        for fk in &table.foreign_keys {
            match fk.unquoted_local_columns().as_slice() {
                [column] => {
                    fk_columns.insert(column.clone());
                }
                _ => return false,
            }
        }

        if column_count == 3 {
            // The third column is a surrogate id, not a link.
            let id = pk_columns[0];
            if fk_columns.contains(id) {
                return false;
            }
            if !table.get_column(id).is_some_and(|c| c.autoincrement) {
                return false;
            }
        }

        true
    }

    /// Check whether `fk` maps its local table's primary key onto its parent.
    pub fn is_inheritance_relationship(&self, schema: &Schema, fk: &ForeignKey) -> bool {
        let Some(local_table) = schema.get_table(&fk.local_table) else {
            return false;
        };
        if !local_table.has_primary_key() {
            return false;
        }

        let mut fk_columns = fk.unquoted_local_columns();
        let mut pk_columns: Vec<String> = local_table
            .primary_key_columns()
            .into_iter()
            .map(|c| crate::schema::unquote(c).to_string())
            .collect();
        fk_columns.sort();
        pk_columns.sort();
        fk_columns == pk_columns
    }
}

impl RelationshipDetector for StructuralDetector {
    fn junction_tables(&self, schema: &Schema, ignore_referenced_tables: bool) -> Vec<Table> {
        schema
            .tables
            .iter()
            .filter(|t| self.is_junction_table(t))
            .filter(|t| !(ignore_referenced_tables && schema.is_referenced(&t.name)))
            .cloned()
            .collect()
    }

    fn child_relationships(&self, schema: &Schema, table_name: &str) -> Vec<ForeignKey> {
        schema
            .foreign_keys()
            .filter(|fk| fk.foreign_table == table_name)
            .filter(|fk| self.is_inheritance_relationship(schema, fk))
            .cloned()
            .collect()
    }
}

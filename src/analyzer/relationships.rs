//! Foreign key classification.
//!
//! Pure functions over a snapshot; [`SchemaAnalyzer`](super::SchemaAnalyzer)
//! feeds them detector output and caches the results.

use std::collections::HashSet;

use crate::schema::{ForeignKey, Schema, Table, SIGNATURE_SEPARATOR};

/// Signature of a foreign key's local side: its unquoted local columns in
/// order, joined with [`SIGNATURE_SEPARATOR`].
pub fn local_column_signature(fk: &ForeignKey) -> String {
    fk.unquoted_local_columns().join(SIGNATURE_SEPARATOR)
}

/// Drop foreign keys whose local column signature was already seen.
///
/// Assumes all keys belong to the same local table. The first key per
/// signature wins and order is otherwise preserved.
pub fn dedupe_foreign_keys<'a, I>(foreign_keys: I) -> Vec<&'a ForeignKey>
where
    I: IntoIterator<Item = &'a ForeignKey>,
{
    let mut seen = HashSet::new();
    foreign_keys
        .into_iter()
        .filter(|fk| seen.insert(local_column_signature(fk)))
        .collect()
}

/// Names of junction tables among `junction_tables` that hold at least one
/// foreign key to `table_name`, each reported once, in input order.
pub fn pivot_tables_for<'a, I>(junction_tables: I, table_name: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a Table>,
{
    junction_tables
        .into_iter()
        .filter(|t| t.foreign_keys.iter().any(|fk| fk.foreign_table == table_name))
        .map(|t| t.name.clone())
        .collect()
}

/// Foreign keys of `schema` pointing at `table_name`, minus those declared
/// by a junction table and those structurally matching a child
/// (inheritance) relationship.
///
/// Keys are deduplicated per table first. Order is table order, then key
/// order within each table.
pub fn classify_incoming<'s>(
    schema: &'s Schema,
    table_name: &str,
    junction_table_names: &HashSet<&str>,
    child_relationships: &[ForeignKey],
) -> Vec<&'s ForeignKey> {
    let is_inheritance = |fk: &ForeignKey| {
        child_relationships
            .iter()
            .any(|child| child.same_local_side(fk))
    };

    schema
        .tables
        .iter()
        .flat_map(|table| dedupe_foreign_keys(&table.foreign_keys))
        .filter(|fk| fk.foreign_table == table_name)
        .filter(|fk| !junction_table_names.contains(fk.local_table.as_str()))
        .filter(|fk| !is_inheritance(*fk))
        .collect()
}

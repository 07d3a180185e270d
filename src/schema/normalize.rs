//! Temporal type normalisation.
//!
//! Catalog readers report date and time columns with mutable value
//! semantics. A snapshot must carry the immutable variants before it is
//! cached or handed to callers.

use super::{ColumnType, Schema};

/// Mutable temporal kind and its immutable counterpart.
pub const IMMUTABLE_TEMPORAL_TYPES: &[(ColumnType, ColumnType)] = &[
    (ColumnType::Date, ColumnType::DateImmutable),
    (ColumnType::DateTime, ColumnType::DateTimeImmutable),
    (ColumnType::DateTimeTz, ColumnType::DateTimeTzImmutable),
    (ColumnType::Time, ColumnType::TimeImmutable),
];

impl ColumnType {
    /// The immutable variant of this type, or the type itself when it has no
    /// entry in [`IMMUTABLE_TEMPORAL_TYPES`].
    pub fn to_immutable(self) -> ColumnType {
        IMMUTABLE_TEMPORAL_TYPES
            .iter()
            .find(|(mutable, _)| *mutable == self)
            .map(|(_, immutable)| *immutable)
            .unwrap_or(self)
    }
}

/// Rewrite every temporal column of `schema` to its immutable variant.
///
/// Returns the number of columns rewritten. Running it twice is a no-op the
/// second time.
pub fn normalize_temporal_types(schema: &mut Schema) -> usize {
    let mut rewritten = 0;
    for column in schema.tables.iter_mut().flat_map(|t| t.columns.iter_mut()) {
        let immutable = column.column_type.to_immutable();
        if immutable != column.column_type {
            column.column_type = immutable;
            rewritten += 1;
        }
    }
    rewritten
}

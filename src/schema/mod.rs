//! Schema snapshot types.
//!
//! A [`Schema`] is a point-in-time view of a database catalog: tables in
//! catalog order, each with its columns, primary key and foreign keys.
//! Snapshots are serialised to JSON when stored in a [`CacheStore`].
//!
//! [`CacheStore`]: crate::cache::CacheStore

mod normalize;
mod types;

pub use normalize::{normalize_temporal_types, IMMUTABLE_TEMPORAL_TYPES};
pub use types::ColumnType;

use serde::{Deserialize, Serialize};

/// Separator used when joining column names into a signature.
///
/// Backtick-wrapped underscores never appear inside an unquoted identifier.
pub const SIGNATURE_SEPARATOR: &str = "__`__";

/// A point-in-time snapshot of a database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables in catalog order.
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Iterate over every foreign key in the schema, table by table.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.tables.iter().flat_map(|t| t.foreign_keys.iter())
    }

    /// Check whether any foreign key in the schema targets `table_name`.
    pub fn is_referenced(&self, table_name: &str) -> bool {
        self.foreign_keys().any(|fk| fk.foreign_table == table_name)
    }
}

/// A table with its columns and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<Column>,
    /// Primary key columns (ordered), if the table has one.
    pub primary_key: Option<Vec<String>>,
    /// Foreign keys declared on this table.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key columns.
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a foreign key. Its local table is forced to this table's name.
    pub fn with_foreign_key(mut self, mut foreign_key: ForeignKey) -> Self {
        foreign_key.local_table = self.name.clone();
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get primary key column names.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.primary_key
            .as_ref()
            .map(|pk| pk.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key.as_ref().is_some_and(|pk| !pk.is_empty())
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Portable type kind.
    pub column_type: ColumnType,
    /// Type as declared in the catalog.
    pub declared_type: String,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Default value expression.
    pub default_value: Option<String>,
    /// Whether this is an identity/auto-increment column.
    pub autoincrement: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            declared_type: column_type.as_str().to_string(),
            nullable: true,
            default_value: None,
            autoincrement: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self.nullable = false;
        self
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name. Catalogs without named constraints synthesise one.
    pub name: String,
    /// Table declaring the constraint.
    pub local_table: String,
    /// Referencing columns (ordered).
    pub local_columns: Vec<String>,
    /// Referenced table.
    pub foreign_table: String,
    /// Referenced columns (ordered).
    pub foreign_columns: Vec<String>,
    /// ON DELETE action.
    pub on_delete: Option<String>,
    /// ON UPDATE action.
    pub on_update: Option<String>,
}

impl ForeignKey {
    pub fn new<L, F>(
        name: impl Into<String>,
        local_table: impl Into<String>,
        local_columns: L,
        foreign_table: impl Into<String>,
        foreign_columns: F,
    ) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            name: name.into(),
            local_table: local_table.into(),
            local_columns: local_columns.into_iter().map(Into::into).collect(),
            foreign_table: foreign_table.into(),
            foreign_columns: foreign_columns.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Local column names with identifier quoting removed.
    pub fn unquoted_local_columns(&self) -> Vec<String> {
        self.local_columns.iter().map(|c| unquote(c).to_string()).collect()
    }

    /// Check whether both keys are declared by the same table over the same
    /// ordered local columns. The foreign side is ignored.
    pub fn same_local_side(&self, other: &ForeignKey) -> bool {
        self.local_table == other.local_table
            && self.unquoted_local_columns() == other.unquoted_local_columns()
    }
}

/// Strip one level of identifier quoting: `"x"`, `` `x` `` or `[x]`.
pub fn unquote(identifier: &str) -> &str {
    let quoted = [('"', '"'), ('`', '`'), ('[', ']')];
    for (open, close) in quoted {
        if let Some(inner) = identifier
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    identifier
}

//! Portable column type kinds.
//!
//! Catalog readers map declared SQL types onto these kinds. The temporal
//! kinds come in a mutable flavour (what readers produce) and an immutable
//! flavour (what cached snapshots carry).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Portable type kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Float,
    String,
    Text,
    Binary,
    Blob,
    Json,
    Guid,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    DateImmutable,
    DateTimeImmutable,
    DateTimeTzImmutable,
    TimeImmutable,
    /// Declared type not recognised; see `Column::declared_type`.
    Unknown,
}

impl ColumnType {
    /// Map a declared SQL type onto a type kind.
    ///
    /// Length, precision and scale parameters are ignored wherever they
    /// appear, so `TIMESTAMP(3) WITH TIME ZONE` reads as
    /// `timestamp with time zone`. Integer modifiers such as `unsigned` are
    /// dropped too.
    pub fn from_declared(declared: &str) -> Self {
        let base = base_type_name(declared);

        match base.as_str() {
            "bool" | "boolean" | "bit" => ColumnType::Boolean,
            "tinyint" | "smallint" | "int2" | "int16" => ColumnType::SmallInt,
            "int" | "integer" | "int4" | "int32" | "mediumint" => ColumnType::Integer,
            "bigint" | "int8" | "int64" => ColumnType::BigInt,
            "decimal" | "numeric" | "number" | "money" => ColumnType::Decimal,
            "real" | "float" | "float4" | "float8" | "double" | "double precision" => {
                ColumnType::Float
            }
            "varchar" | "nvarchar" | "char" | "nchar" | "character" | "character varying"
            | "varchar2" => ColumnType::String,
            "text" | "clob" | "ntext" | "mediumtext" | "longtext" | "string" => ColumnType::Text,
            "binary" | "varbinary" | "bytea" => ColumnType::Binary,
            "blob" | "image" | "longblob" => ColumnType::Blob,
            "json" | "jsonb" => ColumnType::Json,
            "uuid" | "guid" | "uniqueidentifier" => ColumnType::Guid,
            "date" => ColumnType::Date,
            "datetime" | "datetime2" | "smalldatetime" | "timestamp"
            | "timestamp without time zone" => ColumnType::DateTime,
            "timestamptz" | "timestamp with time zone" | "datetimeoffset" => {
                ColumnType::DateTimeTz
            }
            // No portable time-with-zone kind; the zone is kept in declared_type.
            "time" | "time without time zone" | "timetz" | "time with time zone" => {
                ColumnType::Time
            }
            _ => ColumnType::Unknown,
        }
    }

    /// Canonical lowercase name of this type kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::SmallInt => "smallint",
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Decimal => "decimal",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Binary => "binary",
            ColumnType::Blob => "blob",
            ColumnType::Json => "json",
            ColumnType::Guid => "guid",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::DateTimeTz => "datetimetz",
            ColumnType::Time => "time",
            ColumnType::DateImmutable => "date_immutable",
            ColumnType::DateTimeImmutable => "datetime_immutable",
            ColumnType::DateTimeTzImmutable => "datetimetz_immutable",
            ColumnType::TimeImmutable => "time_immutable",
            ColumnType::Unknown => "unknown",
        }
    }
}

/// Lowercased type name with parenthesised parameters and integer
/// modifiers removed and whitespace collapsed.
fn base_type_name(declared: &str) -> String {
    let mut stripped = String::with_capacity(declared.len());
    let mut depth = 0usize;
    for c in declared.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }

    stripped
        .to_lowercase()
        .split_whitespace()
        .filter(|word| !matches!(*word, "unsigned" | "signed" | "zerofill"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

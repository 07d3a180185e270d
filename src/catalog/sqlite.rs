//! SQLite catalog reader.
//!
//! Introspects `sqlite_master` together with the `table_info` and
//! `foreign_key_list` pragmas.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use super::{CatalogError, CatalogReader, CatalogResult, ConnectionIdentity};
use crate::config::ConnectionError;
use crate::schema::{Column, ColumnType, ForeignKey, Schema, Table};

/// [`CatalogReader`] for a SQLite database.
///
/// Queries run on the calling task; SQLite introspection is local and short.
pub struct SqliteCatalogReader {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteCatalogReader {
    /// Open the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn, path.to_string_lossy()))
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> CatalogResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?, ":memory:"))
    }

    /// Wrap an existing connection. `path` identifies the database in cache keys.
    pub fn from_connection(conn: Connection, path: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            path: path.into(),
        }
    }

    /// Run DDL statements against the database.
    pub fn execute_batch(&self, sql: &str) -> CatalogResult<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> CatalogResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CatalogError::Poisoned)
    }

    fn read_schema_blocking(&self) -> CatalogResult<Schema> {
        let conn = self.lock()?;

        let mut tables = Vec::new();
        for (name, has_rowid) in query_tables(&conn)? {
            let (columns, primary_key) = query_columns(&conn, &name, has_rowid)?;
            let foreign_keys = query_foreign_keys(&conn, &name)?;
            tables.push(Table {
                name,
                columns,
                primary_key,
                foreign_keys,
            });
        }

        resolve_implicit_foreign_columns(&mut tables);
        Ok(Schema::new(tables))
    }
}

#[async_trait]
impl CatalogReader for SqliteCatalogReader {
    async fn read_schema(&self) -> CatalogResult<Schema> {
        let schema = self.read_schema_blocking()?;
        tracing::info!(
            path = %self.path,
            tables = schema.tables.len(),
            "read sqlite catalog"
        );
        Ok(schema)
    }
}

impl ConnectionIdentity for SqliteCatalogReader {
    fn host(&self) -> Result<String, ConnectionError> {
        Ok(self.path.clone())
    }

    fn port(&self) -> Result<String, ConnectionError> {
        Ok(String::new())
    }

    fn database_name(&self) -> Result<String, ConnectionError> {
        Ok("main".to_string())
    }

    fn driver_name(&self) -> Result<String, ConnectionError> {
        Ok("sqlite".to_string())
    }
}

/// User tables by name, each with whether it has a rowid.
fn query_tables(conn: &Connection) -> CatalogResult<Vec<(String, bool)>> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let sql: Option<String> = row.get(1)?;
            Ok((name, !sql.as_deref().is_some_and(is_without_rowid)))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tables)
}

/// Check whether a `CREATE TABLE` statement ends in `WITHOUT ROWID`
/// (possibly followed by other table options).
fn is_without_rowid(create_sql: &str) -> bool {
    let Some(options) = create_sql.rfind(')').map(|end| &create_sql[end + 1..]) else {
        return false;
    };
    let words: Vec<String> = options
        .split(|c: char| c == ',' || c.is_whitespace() || c == ';')
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    words.windows(2).any(|pair| pair[0] == "without" && pair[1] == "rowid")
}

fn query_columns(
    conn: &Connection,
    table: &str,
    has_rowid: bool,
) -> CatalogResult<(Vec<Column>, Option<Vec<String>>)> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk \
         FROM pragma_table_info(?1) ORDER BY cid",
    )?;

    let rows = stmt
        .query_map(params![table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(CatalogError::Introspection {
            table: table.to_string(),
            message: "table has no columns".to_string(),
        });
    }

    let mut pk_positions: Vec<(i64, String)> = rows
        .iter()
        .filter(|(_, _, _, _, pk)| *pk > 0)
        .map(|(name, _, _, _, pk)| (*pk, name.clone()))
        .collect();
    pk_positions.sort();

    // A lone INTEGER primary key aliases the rowid, when there is one.
    let rowid_alias = match pk_positions.as_slice() {
        [(_, pk)] if has_rowid => rows
            .iter()
            .any(|(name, ty, ..)| name == pk && ty.eq_ignore_ascii_case("integer")),
        _ => false,
    };

    let columns = rows
        .into_iter()
        .map(|(name, declared_type, not_null, default_value, pk)| {
            let autoincrement = rowid_alias && pk > 0;
            Column {
                name,
                column_type: ColumnType::from_declared(&declared_type),
                declared_type,
                nullable: !not_null && !autoincrement,
                default_value,
                autoincrement,
            }
        })
        .collect();

    let primary_key = if pk_positions.is_empty() {
        None
    } else {
        Some(pk_positions.into_iter().map(|(_, name)| name).collect())
    };

    Ok((columns, primary_key))
}

fn query_foreign_keys(conn: &Connection, table: &str) -> CatalogResult<Vec<ForeignKey>> {
    let mut stmt = conn.prepare(
        "SELECT id, \"table\", \"from\", \"to\", on_update, on_delete \
         FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;

    let rows = stmt
        .query_map(params![table], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // Composite keys span several rows sharing an id.
    let mut grouped: BTreeMap<i64, ForeignKey> = BTreeMap::new();
    for (id, foreign_table, from, to, on_update, on_delete) in rows {
        let fk = grouped.entry(id).or_insert_with(|| ForeignKey {
            name: format!("fk_{}_{}", table, id),
            local_table: table.to_string(),
            local_columns: Vec::new(),
            foreign_table,
            foreign_columns: Vec::new(),
            on_delete: referential_action(on_delete),
            on_update: referential_action(on_update),
        });
        fk.local_columns.push(from);
        if let Some(to) = to {
            fk.foreign_columns.push(to);
        }
    }

    Ok(grouped.into_values().collect())
}

fn referential_action(action: String) -> Option<String> {
    if action.eq_ignore_ascii_case("NO ACTION") {
        None
    } else {
        Some(action)
    }
}

/// `REFERENCES parent` without a column list targets the parent's primary key.
fn resolve_implicit_foreign_columns(tables: &mut [Table]) {
    let primary_keys: BTreeMap<String, Vec<String>> = tables
        .iter()
        .filter_map(|t| t.primary_key.clone().map(|pk| (t.name.clone(), pk)))
        .collect();

    for fk in tables.iter_mut().flat_map(|t| t.foreign_keys.iter_mut()) {
        if fk.foreign_columns.is_empty() {
            if let Some(pk) = primary_keys.get(&fk.foreign_table) {
                fk.foreign_columns = pk.clone();
            }
        }
    }
}

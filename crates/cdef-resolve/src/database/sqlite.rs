//! SQLite main schema backed by rusqlite.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use cdef_model::{ClassificationError, Column, ForeignKey, Result, SchemaModel, Table};

use super::{ConnectionFactory, SchemaConnection, SqlRow};

/// Opens read-only connections to a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    path: PathBuf,
}

impl SqliteConnectionFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags).map_err(|error| {
            ClassificationError::Connection {
                source: format!("{}: {error}", self.path.display()).into(),
            }
        })
    }

    /// Read the schema graph of the database.
    pub fn introspect(&self) -> Result<SchemaModel> {
        let connection = self.connect()?;
        introspect_sqlite_schema(&connection)
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    fn open(&self) -> Result<Box<dyn SchemaConnection>> {
        let connection = self.connect()?;
        info!(path = %self.path.display(), "opened main schema");
        Ok(Box::new(SqliteConnection { connection }))
    }
}

/// A rusqlite connection; closed when dropped.
#[derive(Debug)]
pub struct SqliteConnection {
    connection: Connection,
}

impl SqliteConnection {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl SchemaConnection for SqliteConnection {
    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>> {
        debug!(sql, "executing classification query");
        let fail = |error: rusqlite::Error| ClassificationError::sql(sql, error);
        let mut statement = self.connection.prepare(sql).map_err(fail)?;
        let labels: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = statement.query([]).map_err(fail)?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next().map_err(fail)? {
            let mut values = SqlRow::new();
            for (index, label) in labels.iter().enumerate() {
                values.push(label.as_str(), value_text(row.get_ref(index).map_err(fail)?));
            }
            collected.push(values);
        }
        Ok(collected)
    }
}

fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Build a [`SchemaModel`] from `sqlite_master` and the table pragmas.
pub fn introspect_sqlite_schema(connection: &Connection) -> Result<SchemaModel> {
    const TABLES_SQL: &str = "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
    const COLUMNS_SQL: &str = "SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid";
    const KEYS_SQL: &str =
        "SELECT id, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq";

    let mut statement = connection.prepare(TABLES_SQL).map_err(sql_error(TABLES_SQL))?;
    let names = statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(sql_error(TABLES_SQL))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(sql_error(TABLES_SQL))?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let mut table = Table::new(&name);

        let mut statement = connection.prepare(COLUMNS_SQL).map_err(sql_error(COLUMNS_SQL))?;
        let columns = statement
            .query_map([&name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(sql_error(COLUMNS_SQL))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sql_error(COLUMNS_SQL))?;
        let mut primary_key = Vec::new();
        for (column, db_type, pk_position) in columns {
            let db_type = db_type.filter(|db_type| !db_type.is_empty());
            table.columns.push(Column::new(&column, db_type.as_deref()));
            if pk_position > 0 {
                primary_key.push((pk_position, column));
            }
        }
        primary_key.sort_by_key(|(position, _)| *position);
        table.primary_key = primary_key.into_iter().map(|(_, column)| column).collect();

        let mut statement = connection.prepare(KEYS_SQL).map_err(sql_error(KEYS_SQL))?;
        let references = statement
            .query_map([&name], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(sql_error(KEYS_SQL))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sql_error(KEYS_SQL))?;
        let mut current: Option<(i64, ForeignKey)> = None;
        for (id, foreign_table, from, to) in references {
            if let Some((_, key)) = current.as_mut().filter(|(current_id, _)| *current_id == id) {
                key.local_columns.push(from);
                key.foreign_columns.extend(to);
                continue;
            }
            if let Some((_, key)) = current.take() {
                table.foreign_keys.push(key);
            }
            let mut key = ForeignKey::simple(from, foreign_table, String::new());
            key.foreign_columns = to.into_iter().collect();
            current = Some((id, key));
        }
        if let Some((_, key)) = current {
            table.foreign_keys.push(key);
        }
        tables.push(table);
    }

    fill_implicit_references(&mut tables);
    info!(tables = tables.len(), "introspected main schema");
    Ok(SchemaModel::new(tables))
}

fn sql_error(sql: &'static str) -> impl Fn(rusqlite::Error) -> ClassificationError {
    move |error| ClassificationError::sql(sql, error)
}

/// `REFERENCES parent` without columns targets the parent's primary key.
fn fill_implicit_references(tables: &mut [Table]) {
    let primary_keys: Vec<(String, Vec<String>)> = tables
        .iter()
        .map(|table| (table.name.clone(), table.primary_key.clone()))
        .collect();
    for table in tables.iter_mut() {
        for key in &mut table.foreign_keys {
            if !key.foreign_columns.is_empty() {
                continue;
            }
            if let Some((_, columns)) = primary_keys
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&key.foreign_table))
            {
                key.foreign_columns = columns.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_db() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema.db");
        let connection = Connection::open(&path).expect("open");
        connection
            .execute_batch(
                "CREATE TABLE ORDER_STATUS (STATUS_CODE TEXT PRIMARY KEY, STATUS_NAME TEXT, DISPLAY_ORDER INTEGER);
                 CREATE TABLE ORDER_LINE (
                     ORDER_ID INTEGER, LINE_NO INTEGER, STATUS_CODE TEXT REFERENCES ORDER_STATUS,
                     PRIMARY KEY (ORDER_ID, LINE_NO));
                 INSERT INTO ORDER_STATUS VALUES ('ACC', 'Accepted', 1), ('SHP', 'Shipped', 2);",
            )
            .expect("schema");
        (dir, path)
    }

    #[test]
    fn introspects_keys() {
        let (_dir, path) = schema_db();
        let schema = SqliteConnectionFactory::new(&path).introspect().expect("introspect");

        let status = schema.table("order_status").expect("status");
        assert!(status.is_sole_primary_key("STATUS_CODE"));
        let line = schema.table("ORDER_LINE").expect("line");
        assert!(line.has_compound_primary_key());
        assert_eq!(line.column("STATUS_CODE").and_then(|c| c.db_type.as_deref()), Some("TEXT"));

        let referrers: Vec<&str> = schema
            .simple_referrers("ORDER_STATUS", "STATUS_CODE")
            .map(|(table, _)| table.name.as_str())
            .collect();
        assert_eq!(referrers, vec!["ORDER_LINE"]);
    }

    #[test]
    fn query_returns_text_and_null() {
        let (_dir, path) = schema_db();
        let mut connection = SqliteConnectionFactory::new(&path).open().expect("open");
        let rows = connection
            .query("SELECT STATUS_CODE AS cls_code, DISPLAY_ORDER AS cls_order, NULL AS cls_comment FROM ORDER_STATUS ORDER BY DISPLAY_ORDER")
            .expect("query");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("CLS_CODE"), Some("ACC"));
        assert_eq!(rows[1].get("cls_order"), Some("2"));
        assert_eq!(rows[0].get("cls_comment"), None);
    }

    #[test]
    fn failing_query_carries_sql() {
        let (_dir, path) = schema_db();
        let mut connection = SqliteConnectionFactory::new(&path).open().expect("open");
        let error = connection.query("SELECT * FROM NO_SUCH_TABLE").unwrap_err();
        match error {
            ClassificationError::Sql { sql, .. } => assert_eq!(sql, "SELECT * FROM NO_SUCH_TABLE"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

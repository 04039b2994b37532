//! Main schema access.
//!
//! Extraction only needs "run a query, read the rows". The [`ConnectionFactory`]
//! and [`SchemaConnection`] traits capture exactly that; [`sqlite`] provides
//! the rusqlite implementation together with schema introspection.

pub mod sqlite;

use cdef_model::{ClassificationError, FlexibleMap, Result};
use tracing::debug;

pub use sqlite::{SqliteConnectionFactory, introspect_sqlite_schema};

/// One result row, addressed by case-insensitive column label.
#[derive(Debug, Clone, Default)]
pub struct SqlRow {
    values: FlexibleMap<Option<String>>,
}

impl SqlRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, value: Option<String>) {
        self.values.insert(label, value);
    }

    /// The text value of `label`; `None` for SQL NULL or an unknown label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label).and_then(Option::as_deref)
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.values.contains_key(label)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for SqlRow {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (label, value) in iter {
            row.push(label, value);
        }
        row
    }
}

/// An open connection to the main schema.
pub trait SchemaConnection {
    /// Run a query and collect every row.
    ///
    /// Failures are reported as [`ClassificationError::Sql`] carrying `sql`.
    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>>;
}

/// Opens connections to the main schema.
pub trait ConnectionFactory {
    fn open(&self) -> Result<Box<dyn SchemaConnection>>;
}

/// Factory for runs without a database; opening always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDatabase;

impl ConnectionFactory for NoDatabase {
    fn open(&self) -> Result<Box<dyn SchemaConnection>> {
        Err(ClassificationError::Connection {
            source: "no database is configured".into(),
        })
    }
}

/// A connection opened on first query and closed when dropped.
///
/// One instance is shared by every extraction of a build.
pub struct LazyConnection<'f> {
    factory: &'f dyn ConnectionFactory,
    connection: Option<Box<dyn SchemaConnection>>,
}

impl<'f> LazyConnection<'f> {
    pub fn new(factory: &'f dyn ConnectionFactory) -> Self {
        Self {
            factory,
            connection: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                debug!("opening main schema connection");
                self.factory.open()?
            }
        };
        self.connection.insert(connection).query(sql)
    }

    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            debug!("closed main schema connection");
        }
    }
}

impl Drop for LazyConnection<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LazyConnection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyConnection")
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct CountingFactory {
        opened: Rc<Cell<usize>>,
    }

    struct EmptyConnection;

    impl SchemaConnection for EmptyConnection {
        fn query(&mut self, _sql: &str) -> Result<Vec<SqlRow>> {
            Ok(vec![SqlRow::from_iter([("CLS_CODE", Some("A".to_string()))])])
        }
    }

    impl ConnectionFactory for CountingFactory {
        fn open(&self) -> Result<Box<dyn SchemaConnection>> {
            self.opened.set(self.opened.get() + 1);
            Ok(Box::new(EmptyConnection))
        }
    }

    #[test]
    fn opens_once_on_first_query() {
        let opened = Rc::new(Cell::new(0));
        let factory = CountingFactory {
            opened: Rc::clone(&opened),
        };
        let mut connection = LazyConnection::new(&factory);
        assert!(!connection.is_open());
        assert_eq!(opened.get(), 0);

        let rows = connection.query("select 1").expect("query");
        assert_eq!(rows[0].get("cls_code"), Some("A"));
        connection.query("select 2").expect("query");
        assert_eq!(opened.get(), 1);

        connection.close();
        assert!(!connection.is_open());
    }

    #[test]
    fn no_database_fails_on_open() {
        let mut connection = LazyConnection::new(&NoDatabase);
        let error = connection.query("select 1").unwrap_err();
        assert!(error.is_sql_failure());
    }

    #[test]
    fn null_values_read_as_none() {
        let row = SqlRow::from_iter([("cls_comment", None), ("cls_name", Some("x".to_string()))]);
        assert!(row.has_column("CLS_COMMENT"));
        assert_eq!(row.get("cls_comment"), None);
        assert_eq!(row.get("Cls_Name"), Some("x"));
    }
}

//! Read-only schema graph consumed by deployment resolution.

use serde::{Deserialize, Serialize};

use crate::lookup::FlexibleMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub db_type: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, db_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub local_columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
}

impl ForeignKey {
    pub fn simple(
        local_column: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            local_columns: vec![local_column.into()],
            foreign_table: foreign_table.into(),
            foreign_columns: vec![foreign_column.into()],
        }
    }

    /// True for a single-column key.
    pub fn is_simple_key(&self) -> bool {
        self.local_columns.len() == 1 && self.foreign_columns.len() == 1
    }

    pub fn references(&self, table: &str, column: &str) -> bool {
        self.foreign_table.eq_ignore_ascii_case(table)
            && self
                .foreign_columns
                .iter()
                .any(|c| c.eq_ignore_ascii_case(column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn has_compound_primary_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// True when `column` is the table's only primary-key column.
    pub fn is_sole_primary_key(&self, column: &str) -> bool {
        matches!(self.primary_key.as_slice(), [pk] if pk.eq_ignore_ascii_case(column))
    }
}

/// Tables with their columns and key relationships.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    tables: Vec<Table>,
    index: FlexibleMap<usize>,
}

impl SchemaModel {
    pub fn new(tables: Vec<Table>) -> Self {
        let index = tables
            .iter()
            .enumerate()
            .map(|(position, table)| (table.name.clone(), position))
            .collect();
        Self { tables, index }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.index.get(name).map(|&position| &self.tables[position])
    }

    /// Single-column foreign keys that reference `table.column`, with their owners.
    pub fn simple_referrers<'a>(
        &'a self,
        table: &'a str,
        column: &'a str,
    ) -> impl Iterator<Item = (&'a Table, &'a ForeignKey)> + 'a {
        self.tables.iter().flat_map(move |referrer| {
            referrer
                .foreign_keys
                .iter()
                .filter(move |fk| fk.is_simple_key() && fk.references(table, column))
                .map(move |fk| (referrer, fk))
        })
    }
}

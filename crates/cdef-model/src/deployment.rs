//! Table → column → classification assignments.

use serde::ser::{Serialize, Serializer};

use crate::hint::{HintCandidate, SharedMatcher, WILDCARD, compile_hint, is_pattern_key};
use crate::lookup::FlexibleMap;

/// Column assignments of one table key.
///
/// Pattern keys are compiled once on registration.
#[derive(Debug, Clone, Default)]
pub struct ColumnAssignments {
    columns: FlexibleMap<String>,
    patterns: Vec<(SharedMatcher, String)>,
}

impl ColumnAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `column → classification` unless the column key is already assigned.
    pub fn register(&mut self, column: &str, classification: &str) -> bool {
        let inserted = self
            .columns
            .insert_if_absent(column, classification.to_string());
        if inserted && is_pattern_key(column) {
            self.patterns.push((compile_hint(column), column.to_string()));
        }
        inserted
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Exact key first, then pattern keys in registration order.
    pub fn lookup(&self, candidate: &HintCandidate<'_>) -> Option<&str> {
        if let Some(name) = self.get(candidate.name) {
            return Some(name);
        }
        self.patterns
            .iter()
            .find(|(matcher, _)| matcher.matches(candidate))
            .and_then(|(_, key)| self.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(column, name)| (column, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn retain_classifications(&mut self, keep: &impl Fn(&str) -> bool) {
        self.columns.retain(|_, name| keep(name));
        let columns = &self.columns;
        self.patterns.retain(|(_, key)| columns.contains_key(key));
    }
}

impl Serialize for ColumnAssignments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.columns.serialize(serializer)
    }
}

/// The resolved deployment of classifications onto columns.
///
/// Registration never overwrites: the first assignment of a column wins.
#[derive(Debug, Clone, Default)]
pub struct DeploymentMap {
    tables: FlexibleMap<ColumnAssignments>,
    table_patterns: Vec<(SharedMatcher, String)>,
}

impl DeploymentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, table: &str) -> Option<&ColumnAssignments> {
        self.tables.get(table)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// The `$$ALL$$` assignments that apply to every table.
    pub fn wildcard(&self) -> Option<&ColumnAssignments> {
        self.tables.get(WILDCARD)
    }

    pub fn table_entry(&mut self, table: &str) -> &mut ColumnAssignments {
        if !self.tables.contains_key(table) && table.trim() != WILDCARD && is_pattern_key(table)
        {
            self.table_patterns
                .push((compile_hint(table), table.to_string()));
        }
        self.tables.get_or_insert_with(table, ColumnAssignments::new)
    }

    pub fn register(&mut self, table: &str, column: &str, classification: &str) -> bool {
        self.table_entry(table).register(column, classification)
    }

    pub fn classification_name_for(&self, table: &str, column: &str) -> Option<&str> {
        self.classification_name_for_typed(table, column, None)
    }

    /// Lookup with the column's database type available to `type:` hints.
    ///
    /// Order: the table's exact entry, then every matching table pattern,
    /// then the `$$ALL$$` entry. A miss inside an exact entry still falls
    /// through to the patterns and the wildcard.
    pub fn classification_name_for_typed(
        &self,
        table: &str,
        column: &str,
        db_type: Option<&str>,
    ) -> Option<&str> {
        let candidate = HintCandidate::typed(column, db_type);
        let exact = self
            .tables
            .get(table)
            .filter(|_| table.trim() != WILDCARD)
            .and_then(|assignments| assignments.lookup(&candidate));
        exact
            .or_else(|| {
                self.matching_patterns(table)
                    .find_map(|assignments| assignments.lookup(&candidate))
            })
            .or_else(|| self.wildcard()?.lookup(&candidate))
    }

    /// Assignments of every table pattern matching `table`, in registration order.
    pub fn pattern_assignments(&self, table: &str) -> Vec<(String, String)> {
        self.matching_patterns(table)
            .flat_map(|assignments| {
                assignments
                    .iter()
                    .map(|(column, classification)| (column.to_string(), classification.to_string()))
            })
            .collect()
    }

    fn matching_patterns<'m>(&'m self, table: &str) -> impl Iterator<Item = &'m ColumnAssignments> {
        let table = table.to_string();
        self.table_patterns
            .iter()
            .filter(move |(matcher, _)| matcher.matches(&HintCandidate::named(&table)))
            .filter_map(|(_, key)| self.tables.get(key))
    }

    /// Drop every assignment whose classification fails `keep`.
    pub fn retain_classifications(&mut self, keep: impl Fn(&str) -> bool) {
        for (_, assignments) in self.tables.iter_mut() {
            assignments.retain_classifications(&keep);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnAssignments)> {
        self.tables.iter()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.tables.values().map(ColumnAssignments::len).sum()
    }
}

impl Serialize for DeploymentMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tables.serialize(serializer)
    }
}

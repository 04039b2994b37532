//! Classification model.
//!
//! A [`ClassificationTop`] is one named, closed set of domain values (for
//! example order status codes). Its [`ClassificationElement`]s come from one
//! or more origins:
//!
//! - literal element maps written in the definition file
//! - rows extracted from a database table
//! - rows of the all-in-one SQL statement
//! - external resource files
//!
//! ## Example
//!
//! ```text
//! OrderStatus (table classification, code type String)
//!   ACC  Accepted   alias "accepted"
//!   SHP  Shipped    alias "shipped"
//! ```

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::handling::UndefinedHandlingType;
use crate::lookup::FlexibleMap;

/// Where a classification was first defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOrigin {
    Literal,
    Table,
    AllInOne,
    Resource,
}

impl ClassificationOrigin {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Table => "table",
            Self::AllInOne => "all-in-one",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for ClassificationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value of a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationElement {
    /// Name of the owning classification.
    pub classification_name: String,
    pub code: String,
    /// Identifier-safe name.
    pub name: String,
    pub alias: Option<String>,
    pub comment: Option<String>,
    pub sub_items: IndexMap<String, String>,
    /// Alternate codes accepted for this element.
    pub sister_codes: Vec<String>,
    /// Source table, set only for table-derived elements.
    pub table: Option<String>,
}

impl ClassificationElement {
    pub fn new(
        classification_name: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            classification_name: classification_name.into(),
            code: code.into(),
            name: name.into(),
            alias: None,
            comment: None,
            sub_items: IndexMap::new(),
            sister_codes: Vec::new(),
            table: None,
        }
    }

    pub fn is_table_derived(&self) -> bool {
        self.table.is_some()
    }
}

/// A named subset of elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingDefinition {
    pub comment: Option<String>,
    pub element_names: Vec<String>,
    pub use_document_only: bool,
}

/// One table-sourced entry of a table classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSource {
    pub table: String,
    /// Column holding the code, used for automatic deployment. `None` when
    /// the code is a literal SQL expression.
    pub code_column: Option<String>,
    pub suppress_auto_deploy: bool,
    pub suppress_db_access_class: bool,
}

/// One named domain value set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationTop {
    pub name: String,
    pub origin: ClassificationOrigin,
    pub top_comment: Option<String>,
    pub code_type: Option<String>,
    pub check_classification_code: bool,
    pub undefined_handling_type: UndefinedHandlingType,
    pub check_implicit_set: bool,
    pub check_selected_classification: bool,
    pub force_classification_setting: bool,
    pub use_document_only: bool,
    pub suppress_auto_deploy: bool,
    pub suppress_db_access_class: bool,
    pub deprecated: bool,
    pub grouping_map: IndexMap<String, GroupingDefinition>,
    /// Element name to deprecation reason.
    pub deprecated_map: IndexMap<String, String>,
    pub is_table_classification: bool,
    /// Column name that resource-sourced classifications deploy to.
    pub related_column_name: Option<String>,
    pub table_sources: Vec<TableSource>,
    pub elements: Vec<ClassificationElement>,
}

impl ClassificationTop {
    pub fn new(
        name: impl Into<String>,
        origin: ClassificationOrigin,
        handling: UndefinedHandlingType,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            top_comment: None,
            code_type: None,
            check_classification_code: handling.is_checked(),
            undefined_handling_type: handling,
            check_implicit_set: false,
            check_selected_classification: false,
            force_classification_setting: false,
            use_document_only: false,
            suppress_auto_deploy: false,
            suppress_db_access_class: false,
            deprecated: false,
            grouping_map: IndexMap::new(),
            deprecated_map: IndexMap::new(),
            is_table_classification: false,
            related_column_name: None,
            table_sources: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Case-insensitive code membership.
    pub fn contains_code(&self, code: &str) -> bool {
        self.find_by_code(code).is_some()
    }

    pub fn find_by_code(&self, code: &str) -> Option<&ClassificationElement> {
        self.elements
            .iter()
            .find(|element| element.code.eq_ignore_ascii_case(code))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ClassificationElement> {
        self.elements.iter().find(|element| element.name == name)
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|element| element.name.as_str())
    }

    pub fn set_handling(&mut self, handling: UndefinedHandlingType) {
        self.undefined_handling_type = handling;
        self.check_classification_code = handling.is_checked();
    }

    /// Table sources whose code column takes part in automatic deployment.
    pub fn deployable_sources(&self) -> impl Iterator<Item = &TableSource> {
        let suppressed = self.suppress_auto_deploy;
        self.table_sources
            .iter()
            .filter(move |source| {
                !suppressed && !source.suppress_auto_deploy && source.code_column.is_some()
            })
    }
}

/// The resolved classification set of one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationModel {
    pub tops: IndexMap<String, ClassificationTop>,
    /// Names removed because they are documentation-only.
    pub document_only_names: BTreeSet<String>,
    /// Tables whose table classification opted out of accessor generation.
    pub db_access_suppressed_tables: FlexibleMap<()>,
}

impl ClassificationModel {
    pub fn get(&self, name: &str) -> Option<&ClassificationTop> {
        self.tops.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tops.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassificationTop> {
        self.tops.values()
    }

    pub fn table_classifications(&self) -> impl Iterator<Item = &ClassificationTop> {
        self.tops.values().filter(|top| top.is_table_classification)
    }

    pub fn is_document_only(&self, name: &str) -> bool {
        self.document_only_names.contains(name)
    }

    pub fn is_db_access_suppressed(&self, table: &str) -> bool {
        self.db_access_suppressed_tables.contains_key(table)
    }
}

//! Typed classification definitions.
//!
//! A definition map has one entry per classification plus two reserved keys:
//!
//! ```toml
//! "$$SQL$$" = "select CLS_NAME as classificationName, ... from CLS_MASTER"
//!
//! [[Flg]]
//! topComment = "general boolean classification"
//! codeType = "Number"
//!
//! [[Flg]]
//! code = "1"
//! name = "True"
//! alias = "Checked"
//!
//! [[OrderStatus]]
//! topComment = "status of an order"
//!
//! [[OrderStatus]]
//! table = "ORDER_STATUS"
//! code = "STATUS_CODE"
//! name = "STATUS_NAME"
//! orderBy = "DISPLAY_ORDER"
//! ```
//!
//! Each list item is one of three shapes:
//!
//! - **top metadata**: carries `topComment`
//! - **table source**: carries a non-empty `table`
//! - **literal element**: anything else

use indexmap::IndexMap;

use cdef_model::{ClassificationError, GroupingDefinition, Result};

use crate::raw::{RawMap, RawNode, flag, non_empty, required_text, text};

/// Key holding the all-in-one SQL statement.
pub const SQL_KEY: &str = "$$SQL$$";

/// Key holding split keywords.
pub const SPLIT_KEY: &str = "$$split$$";

/// Escape prefix marking an expression to embed verbatim in generated SQL.
pub const LITERAL_SQL_PREFIX: &str = "$sql:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopMetaDefinition {
    pub top_comment: String,
    pub code_type: Option<String>,
    pub check_classification_code: Option<bool>,
    pub undefined_handling_type: Option<String>,
    pub check_implicit_set: Option<bool>,
    pub check_selected_classification: Option<bool>,
    pub force_classification_setting: Option<bool>,
    pub use_document_only: Option<bool>,
    pub suppress_auto_deploy: Option<bool>,
    pub suppress_db_access_class: Option<bool>,
    pub deprecated: Option<bool>,
    pub grouping_map: IndexMap<String, GroupingDefinition>,
    pub deprecated_map: IndexMap<String, String>,
    pub related_column_name: Option<String>,
}

impl TopMetaDefinition {
    pub fn handling_hints(&self) -> HandlingHints {
        HandlingHints {
            check_implicit_set: self.check_implicit_set,
            undefined_handling_type: self.undefined_handling_type.clone(),
            check_selected_classification: self.check_selected_classification,
        }
    }
}

/// The subset of top metadata that decides undefined-code handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlingHints {
    pub check_implicit_set: Option<bool>,
    pub undefined_handling_type: Option<String>,
    pub check_selected_classification: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSourceDefinition {
    pub table: String,
    pub code: String,
    pub name: String,
    pub alias: Option<String>,
    pub comment: Option<String>,
    pub where_clause: Option<String>,
    pub order_by: Option<String>,
    pub except_codes: Vec<String>,
    /// Sub-item key to column expression.
    pub sub_item_columns: IndexMap<String, String>,
    pub suppress_auto_deploy: bool,
    pub suppress_db_access_class: bool,
}

impl TableSourceDefinition {
    pub fn new(table: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            code: code.into(),
            name: name.into(),
            alias: None,
            comment: None,
            where_clause: None,
            order_by: None,
            except_codes: Vec::new(),
            sub_item_columns: IndexMap::new(),
            suppress_auto_deploy: false,
            suppress_db_access_class: false,
        }
    }

    /// The code column, or `None` when the code is a literal SQL expression.
    pub fn code_column(&self) -> Option<&str> {
        if self.code.starts_with(LITERAL_SQL_PREFIX) {
            None
        } else {
            Some(self.code.trim())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralDefinition {
    pub code: String,
    pub name: String,
    pub alias: Option<String>,
    pub comment: Option<String>,
    pub sister_codes: Vec<String>,
    pub sub_items: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryShape {
    TopMeta(TopMetaDefinition),
    TableSource(TableSourceDefinition),
    Literal(LiteralDefinition),
}

/// A validated definition map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationDefinitions {
    pub all_in_one_sql: Option<String>,
    pub classifications: IndexMap<String, Vec<EntryShape>>,
}

impl ClassificationDefinitions {
    /// Validate a (split-resolved) definition map.
    pub fn from_raw(raw: &RawMap) -> Result<Self> {
        let mut definitions = Self::default();
        for (key, node) in raw {
            match key.as_str() {
                SQL_KEY => {
                    definitions.all_in_one_sql = non_empty(node.as_text(SQL_KEY)?);
                }
                SPLIT_KEY => {
                    return Err(ClassificationError::shape(
                        SPLIT_KEY,
                        "resolved split definitions",
                        "unresolved split marker",
                    ));
                }
                name => {
                    let entries = parse_entries(name, node)?;
                    definitions.classifications.insert(name.to_string(), entries);
                }
            }
        }
        Ok(definitions)
    }

    pub fn is_empty(&self) -> bool {
        self.all_in_one_sql.is_none() && self.classifications.is_empty()
    }
}

fn parse_entries(name: &str, node: &RawNode) -> Result<Vec<EntryShape>> {
    node.as_list(name)?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let path = format!("{name}[{index}]");
            parse_entry(item.as_map(&path)?, &path)
        })
        .collect()
}

fn parse_entry(map: &RawMap, path: &str) -> Result<EntryShape> {
    if map.contains_key("topComment") {
        return parse_top_meta(map, path).map(EntryShape::TopMeta);
    }
    if text(map, "table", path)?.is_some() {
        return parse_table_source(map, path).map(EntryShape::TableSource);
    }
    parse_literal(map, path).map(EntryShape::Literal)
}

fn parse_top_meta(map: &RawMap, path: &str) -> Result<TopMetaDefinition> {
    let use_document_only = match flag(map, "isUseDocumentOnly", path)? {
        Some(value) => Some(value),
        None => flag(map, "useDocumentOnly", path)?,
    };
    Ok(TopMetaDefinition {
        top_comment: text(map, "topComment", path)?.unwrap_or_default(),
        code_type: text(map, "codeType", path)?,
        check_classification_code: flag(map, "checkClassificationCode", path)?,
        undefined_handling_type: text(map, "undefinedHandlingType", path)?,
        check_implicit_set: flag(map, "checkImplicitSet", path)?,
        check_selected_classification: flag(map, "checkSelectedClassification", path)?,
        force_classification_setting: flag(map, "forceClassificationSetting", path)?,
        use_document_only,
        suppress_auto_deploy: flag(map, "suppressAutoDeploy", path)?,
        suppress_db_access_class: flag(map, "suppressDBAccessClass", path)?,
        deprecated: flag(map, "deprecated", path)?,
        grouping_map: parse_grouping_map(map, path)?,
        deprecated_map: string_map(map, "deprecatedMap", path)?,
        related_column_name: text(map, "relatedColumnName", path)?,
    })
}

fn parse_grouping_map(map: &RawMap, path: &str) -> Result<IndexMap<String, GroupingDefinition>> {
    let Some(node) = map.get("groupingMap") else {
        return Ok(IndexMap::new());
    };
    let grouping_path = format!("{path}.groupingMap");
    let mut groups = IndexMap::new();
    for (group, group_node) in node.as_map(&grouping_path)? {
        let group_path = format!("{grouping_path}.{group}");
        let group_map = group_node.as_map(&group_path)?;
        let element_names = match group_map.get("elementList") {
            Some(list) => list.as_text_list(&format!("{group_path}.elementList"))?,
            None => Vec::new(),
        };
        groups.insert(
            group.clone(),
            GroupingDefinition {
                comment: text(group_map, "groupComment", &group_path)?,
                element_names,
                use_document_only: flag(group_map, "isUseDocumentOnly", &group_path)?
                    .unwrap_or(false),
            },
        );
    }
    Ok(groups)
}

fn parse_table_source(map: &RawMap, path: &str) -> Result<TableSourceDefinition> {
    let mut source = TableSourceDefinition::new(
        required_text(map, "table", path)?,
        required_text(map, "code", path)?,
        required_text(map, "name", path)?,
    );
    source.alias = text(map, "alias", path)?;
    source.comment = text(map, "comment", path)?;
    source.where_clause = text(map, "where", path)?;
    source.order_by = text(map, "orderBy", path)?;
    source.except_codes = match map.get("exceptCodeList") {
        Some(node) => node.as_text_list(&format!("{path}.exceptCodeList"))?,
        None => Vec::new(),
    };
    source.sub_item_columns = string_map(map, "subItemMap", path)?;
    source.suppress_auto_deploy = flag(map, "suppressAutoDeploy", path)?.unwrap_or(false);
    source.suppress_db_access_class = flag(map, "suppressDBAccessClass", path)?.unwrap_or(false);
    Ok(source)
}

fn parse_literal(map: &RawMap, path: &str) -> Result<LiteralDefinition> {
    let sister_codes = match map.get("sisterCode") {
        Some(node) => node.as_text_list(&format!("{path}.sisterCode"))?,
        None => Vec::new(),
    };
    Ok(LiteralDefinition {
        code: required_text(map, "code", path)?,
        name: required_text(map, "name", path)?,
        alias: text(map, "alias", path)?,
        comment: text(map, "comment", path)?,
        sister_codes,
        sub_items: string_map(map, "subItemMap", path)?,
    })
}

fn string_map(map: &RawMap, key: &str, path: &str) -> Result<IndexMap<String, String>> {
    let Some(node) = map.get(key) else {
        return Ok(IndexMap::new());
    };
    let map_path = format!("{path}.{key}");
    node.as_map(&map_path)?
        .iter()
        .map(|(item_key, value)| {
            let value = value.as_text(&format!("{map_path}.{item_key}"))?;
            Ok((item_key.clone(), value.to_string()))
        })
        .collect()
}

/// Explicit deployment definition: table key → column key → classification name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentDefinition {
    pub tables: IndexMap<String, IndexMap<String, String>>,
}

impl DeploymentDefinition {
    pub fn from_raw(raw: &RawMap) -> Result<Self> {
        let mut tables = IndexMap::new();
        for (table, node) in raw {
            let columns = node
                .as_map(table)?
                .iter()
                .map(|(column, value)| {
                    let name = value.as_text(&format!("{table}.{column}"))?;
                    Ok((column.clone(), name.trim().to_string()))
                })
                .collect::<Result<IndexMap<_, _>>>()?;
            tables.insert(table.clone(), columns);
        }
        Ok(Self { tables })
    }
}

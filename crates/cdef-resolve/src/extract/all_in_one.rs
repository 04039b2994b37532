//! The all-in-one classification query.
//!
//! One statement returns the elements of many classifications:
//!
//! ```sql
//! SELECT CLS_TYPE AS classificationName, CODE AS code, NAME AS name,
//!        ALIAS AS alias, REMARK AS comment, TYPE_COMMENT AS topComment
//!   FROM CLS_MASTER ORDER BY CLS_TYPE, DISPLAY_ORDER
//! ```

use indexmap::IndexMap;
use tracing::{debug, info};

use cdef_definition::SQL_KEY;
use cdef_model::{ClassificationElement, ClassificationError, Result};

use crate::database::{LazyConnection, SqlRow};
use crate::extract::table::escape_text;

const CLASSIFICATION_NAME: &str = "classificationName";
const CODE: &str = "code";
const NAME: &str = "name";
const ALIAS: &str = "alias";
const COMMENT: &str = "comment";
const TOP_COMMENT: &str = "topComment";
const CODE_TYPE: &str = "codeType";

/// Rows of one classification, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllInOneGroup {
    pub name: String,
    /// First non-empty `topComment` of the group.
    pub top_comment: Option<String>,
    /// First non-empty `codeType` of the group.
    pub code_type: Option<String>,
    pub elements: Vec<ClassificationElement>,
}

/// Run the all-in-one statement and group its rows by classification name.
pub fn extract_all_in_one(
    sql: &str,
    connection: &mut LazyConnection<'_>,
) -> Result<Vec<AllInOneGroup>> {
    debug!(%sql, "executing all-in-one classification query");
    let rows = connection.query(sql)?;
    let groups = group_rows(&rows)?;
    info!(
        rows = rows.len(),
        classifications = groups.len(),
        "extracted all-in-one classifications"
    );
    Ok(groups)
}

fn group_rows(rows: &[SqlRow]) -> Result<Vec<AllInOneGroup>> {
    let mut groups: IndexMap<String, AllInOneGroup> = IndexMap::new();
    for row in rows {
        for label in [CLASSIFICATION_NAME, CODE, NAME] {
            if !row.has_column(label) {
                return Err(ClassificationError::MissingField {
                    path: SQL_KEY.to_string(),
                    key: label,
                });
            }
        }
        let (Some(name), Some(code)) = (non_blank(row, CLASSIFICATION_NAME), non_blank(row, CODE))
        else {
            debug!("skipping all-in-one row without classification name or code");
            continue;
        };
        let group = groups
            .entry(name.to_string())
            .or_insert_with(|| AllInOneGroup {
                name: name.to_string(),
                top_comment: None,
                code_type: None,
                elements: Vec::new(),
            });
        if group.top_comment.is_none() {
            group.top_comment = non_blank(row, TOP_COMMENT).map(str::to_string);
        }
        if group.code_type.is_none() {
            group.code_type = non_blank(row, CODE_TYPE).map(str::to_string);
        }

        let mut element =
            ClassificationElement::new(name, code, non_blank(row, NAME).unwrap_or(code));
        element.alias = non_blank(row, ALIAS).map(escape_text);
        element.comment = non_blank(row, COMMENT).map(escape_text);
        group.elements.push(element);
    }
    Ok(groups.into_values().collect())
}

fn non_blank<'r>(row: &'r SqlRow, label: &str) -> Option<&'r str> {
    row.get(label)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[(&str, Option<&str>)]) -> SqlRow {
        values
            .iter()
            .map(|(label, value)| (*label, value.map(str::to_string)))
            .collect()
    }

    #[test]
    fn groups_in_first_seen_order_with_first_comment() {
        let rows = vec![
            row(&[
                ("CLASSIFICATIONNAME", Some("Region")),
                ("CODE", Some("JP")),
                ("NAME", Some("Japan")),
                ("topcomment", None),
            ]),
            row(&[
                ("classificationName", Some("Rank")),
                ("code", Some("G")),
                ("name", Some("Gold")),
                ("topComment", Some("member rank")),
            ]),
            row(&[
                ("classificationName", Some("Region")),
                ("code", Some("US")),
                ("name", Some("America")),
                ("topComment", Some("sales region")),
            ]),
            row(&[
                ("classificationName", Some("Region")),
                ("code", Some("FR")),
                ("name", Some("France")),
                ("topComment", Some("ignored")),
            ]),
        ];
        let groups = group_rows(&rows).expect("groups");
        let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, vec!["Region", "Rank"]);
        assert_eq!(groups[0].top_comment.as_deref(), Some("sales region"));
        let codes: Vec<&str> = groups[0].elements.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["JP", "US", "FR"]);
    }

    #[test]
    fn missing_label_is_reported() {
        let rows = vec![row(&[("classificationName", Some("Region")), ("code", Some("JP"))])];
        let error = group_rows(&rows).unwrap_err();
        assert!(matches!(error, ClassificationError::MissingField { key: "name", .. }));
    }
}

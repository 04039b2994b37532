//! Table classification extraction.
//!
//! A table-sourced definition becomes one `SELECT` against the main schema;
//! every surviving row becomes one element.

use std::collections::HashSet;

use tracing::debug;

use cdef_definition::{LITERAL_SQL_PREFIX, TableSourceDefinition};
use cdef_model::{ClassificationElement, Result, SqlDialect, fold_key};

use crate::database::LazyConnection;

const CODE_LABEL: &str = "cls_code";
const NAME_LABEL: &str = "cls_name";
const ALIAS_LABEL: &str = "cls_alias";
const COMMENT_LABEL: &str = "cls_comment";
const SUB_ITEM_PREFIX: &str = "cls_sub_";

/// Build the extraction `SELECT` for a table source.
///
/// Identifiers are quoted by `dialect` unless they start with `$sql:`, in
/// which case the remainder is embedded verbatim. `where` and `orderBy` are
/// SQL fragments and always embedded verbatim.
pub fn build_select(source: &TableSourceDefinition, dialect: SqlDialect) -> String {
    let expr = |value: &str| sql_expression(value, dialect);
    let alias = source.alias.as_deref().unwrap_or(&source.name);
    let comment = source
        .comment
        .as_deref()
        .map_or_else(|| "NULL".to_string(), expr);

    let mut sql = format!(
        "SELECT {} AS {CODE_LABEL}, {} AS {NAME_LABEL}, {} AS {ALIAS_LABEL}, {comment} AS {COMMENT_LABEL}",
        expr(&source.code),
        expr(&source.name),
        expr(alias),
    );
    for (index, column) in source.sub_item_columns.values().enumerate() {
        sql.push_str(&format!(", {} AS {}", expr(column), sub_item_label(index)));
    }
    sql.push_str(&format!(" FROM {}", expr(&source.table)));
    if let Some(where_clause) = &source.where_clause {
        sql.push_str(&format!(" WHERE {where_clause}"));
    }
    if let Some(order_by) = &source.order_by {
        sql.push_str(&format!(" ORDER BY {order_by}"));
    }
    sql
}

/// Sub-item keys are free text, so their columns are labelled by position.
fn sub_item_label(index: usize) -> String {
    format!("{SUB_ITEM_PREFIX}{index}")
}

fn sql_expression(value: &str, dialect: SqlDialect) -> String {
    match value.strip_prefix(LITERAL_SQL_PREFIX) {
        Some(verbatim) => verbatim.trim().to_string(),
        None => dialect.quote_identifier(value),
    }
}

/// Run the table source query and turn its rows into elements.
///
/// Rows whose code is in the except list, or repeats an earlier row's code,
/// are skipped. Both checks ignore case.
pub fn extract_table_elements(
    classification: &str,
    source: &TableSourceDefinition,
    dialect: SqlDialect,
    connection: &mut LazyConnection<'_>,
) -> Result<Vec<ClassificationElement>> {
    let sql = build_select(source, dialect);
    debug!(classification, table = %source.table, %sql, "extracting table classification");
    let rows = connection.query(&sql)?;

    let except: HashSet<String> = source.except_codes.iter().map(|code| fold_key(code)).collect();
    let mut seen = HashSet::new();
    let mut elements = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(code) = row.get(CODE_LABEL) else {
            debug!(classification, "skipping row without code");
            continue;
        };
        let folded = fold_key(code);
        if except.contains(&folded) || !seen.insert(folded) {
            continue;
        }
        let display_name = row.get(NAME_LABEL).unwrap_or(code);
        let mut element =
            ClassificationElement::new(classification, code, element_name(display_name, code));
        element.alias = row.get(ALIAS_LABEL).map(escape_text);
        element.comment = row.get(COMMENT_LABEL).map(escape_text);
        for (index, key) in source.sub_item_columns.keys().enumerate() {
            if let Some(value) = row.get(&sub_item_label(index)) {
                element.sub_items.insert(key.clone(), escape_text(value));
            }
        }
        element.table = Some(source.table.clone());
        elements.push(element);
    }
    debug!(classification, elements = elements.len(), "extracted table classification");
    Ok(elements)
}

fn replacement(c: char) -> Option<&'static str> {
    Some(match c {
        ' ' | '\u{3000}' | '\t' | '/' | '\\' | '.' | '-' | '(' | ')' | '[' | ']' | '{' | '}'
        | '<' | '>' | '\'' | '"' | '`' | ':' | ';' | ',' | '=' | '~' | '^' | '|' | '$' | '!'
        | '、' | '。' | '・' | '（' | '）' | '「' | '」' | '『' | '』' | '【' | '】' | '［'
        | '］' | '〈' | '〉' | '《' | '》' | '〔' | '〕' | '｛' | '｝' | '：' | '；' | '，'
        | '．' | '／' | '！' | '－' | '～' | '“' | '”' | '‘' | '’' => "_",
        '?' | '？' => "Question",
        '%' | '％' => "Percent",
        '&' | '＆' => "And",
        '+' | '＋' => "Plus",
        '#' => "Sharp",
        '@' => "At",
        '*' => "Asterisk",
        _ => return None,
    })
}

/// Element name for a row: the sanitized display name, else the sanitized
/// code, else the code's scalar values spelled out in hex.
fn element_name(display_name: &str, code: &str) -> String {
    let name = sanitize_element_name(display_name);
    if !name.is_empty() {
        return name;
    }
    let from_code = sanitize_element_name(code);
    if !from_code.is_empty() {
        return from_code;
    }
    let mut spelled = String::from("Code");
    for c in code.chars() {
        spelled.push_str(&format!("{:X}", u32::from(c)));
    }
    spelled
}

/// Turn a display name into an identifier-safe element name.
///
/// Disallowed characters become `_` or a spelled-out token, the result is
/// camel-cased on `_`, and a leading digit gets an `N` prefix.
pub fn sanitize_element_name(name: &str) -> String {
    let mut replaced = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match replacement(c) {
            Some(token) => replaced.push_str(token),
            None => replaced.push(c),
        }
    }
    let camel = camelize(&replaced);
    if camel.starts_with(|c: char| c.is_ascii_digit()) {
        format!("N{camel}")
    } else {
        camel
    }
}

fn camelize(name: &str) -> String {
    let mut camel = String::with_capacity(name.len());
    for segment in name.split('_').filter(|segment| !segment.is_empty()) {
        let all_upper = segment.chars().any(char::is_alphabetic)
            && !segment.chars().any(char::is_lowercase);
        let segment = if all_upper {
            segment.to_lowercase()
        } else {
            segment.to_string()
        };
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            camel.extend(first.to_uppercase());
            camel.push_str(chars.as_str());
        }
    }
    camel
}

/// Escape text for embedding in a double-quoted literal.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '"' => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }
    escaped
}

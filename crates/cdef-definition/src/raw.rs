//! Generic definition tree.
//!
//! Definition files are TOML documents. Scalars (strings, numbers, booleans,
//! dates) all become [`RawNode::Text`]; shape checks happen once, when the
//! tree is validated into typed definitions.

use std::path::Path;

use indexmap::IndexMap;

use cdef_model::{ClassificationError, Result};

/// Insertion-ordered map node.
pub type RawMap = IndexMap<String, RawNode>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNode {
    Text(String),
    List(Vec<RawNode>),
    Map(RawMap),
}

impl RawNode {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn as_text(&self, path: &str) -> Result<&str> {
        match self {
            Self::Text(text) => Ok(text.as_str()),
            other => Err(ClassificationError::shape(path, "text", other.kind())),
        }
    }

    pub fn as_list(&self, path: &str) -> Result<&[RawNode]> {
        match self {
            Self::List(items) => Ok(items.as_slice()),
            other => Err(ClassificationError::shape(path, "list", other.kind())),
        }
    }

    pub fn as_map(&self, path: &str) -> Result<&RawMap> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(ClassificationError::shape(path, "map", other.kind())),
        }
    }

    /// Text, or each text item of a list.
    pub fn as_text_list(&self, path: &str) -> Result<Vec<String>> {
        match self {
            Self::Text(text) => Ok(vec![text.clone()]),
            Self::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_text(&format!("{path}[{index}]"))
                        .map(str::to_string)
                })
                .collect(),
            Self::Map(_) => Err(ClassificationError::shape(path, "text or list", "map")),
        }
    }
}

impl From<toml::Value> for RawNode {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(text) => Self::Text(text),
            toml::Value::Integer(number) => Self::Text(number.to_string()),
            toml::Value::Float(number) => Self::Text(number.to_string()),
            toml::Value::Boolean(flag) => Self::Text(flag.to_string()),
            toml::Value::Datetime(datetime) => Self::Text(datetime.to_string()),
            toml::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            toml::Value::Table(table) => Self::Map(map_from_table(table)),
        }
    }
}

fn map_from_table(table: toml::Table) -> RawMap {
    table
        .into_iter()
        .map(|(key, value)| (key, RawNode::from(value)))
        .collect()
}

/// Parse a TOML document into a definition map.
pub fn parse_definition_str(text: &str, origin: &Path) -> Result<RawMap> {
    let table: toml::Table = toml::from_str(text).map_err(|error| ClassificationError::Parse {
        path: origin.to_path_buf(),
        message: error.to_string(),
    })?;
    Ok(map_from_table(table))
}

pub fn load_definition_file(path: &Path) -> Result<RawMap> {
    let text =
        std::fs::read_to_string(path).map_err(|error| ClassificationError::io(path, error))?;
    parse_definition_str(&text, path)
}

/// Read an optional boolean flag ("true"/"false", case-insensitive).
pub fn flag(map: &RawMap, key: &str, path: &str) -> Result<Option<bool>> {
    let Some(node) = map.get(key) else {
        return Ok(None);
    };
    let value_path = format!("{path}.{key}");
    let text = node.as_text(&value_path)?;
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => Err(ClassificationError::shape(value_path, "boolean", "text")),
    }
}

/// Read an optional text value, treating blank text as absent.
pub fn text(map: &RawMap, key: &str, path: &str) -> Result<Option<String>> {
    match map.get(key) {
        Some(node) => {
            let value = node.as_text(&format!("{path}.{key}"))?;
            Ok(non_empty(value))
        }
        None => Ok(None),
    }
}

pub fn required_text(map: &RawMap, key: &'static str, path: &str) -> Result<String> {
    text(map, key, path)?.ok_or_else(|| ClassificationError::MissingField {
        path: path.to_string(),
        key,
    })
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_become_text_and_order_is_kept() {
        let map = parse_definition_str(
            "zeta = 1\nalpha = true\n[[Flg]]\ncode = 1\nname = \"True\"\n",
            Path::new("inline.toml"),
        )
        .expect("parse");
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "Flg"]);
        assert_eq!(map["zeta"], RawNode::Text("1".to_string()));
        let items = map["Flg"].as_list("Flg").expect("list");
        let first = items[0].as_map("Flg[0]").expect("map");
        assert_eq!(first["code"], RawNode::Text("1".to_string()));
    }

    #[test]
    fn wrong_shape_reports_path() {
        let node = RawNode::Text("x".to_string());
        let error = node.as_list("Flg").unwrap_err();
        assert!(error.to_string().contains("Flg"));
        assert!(error.to_string().contains("expected list"));
    }
}

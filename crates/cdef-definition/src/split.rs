//! Split definition files.
//!
//! A large definition map may be cut into partial files. The base file names
//! the partials under the `$$split$$` key:
//!
//! ```toml
//! ["$$split$$"]
//! order = "order domain"
//! member = "member domain"
//! ```
//!
//! With a base name of `classificationDefinitionMap`, this loads
//! `classificationDefinitionMap_order.toml` and
//! `classificationDefinitionMap_member.toml`.

use std::path::{Path, PathBuf};

use tracing::debug;

use cdef_model::{ClassificationError, Result};

use crate::definition::SPLIT_KEY;
use crate::raw::{RawMap, load_definition_file};

/// Loads a partial definition map by file stem.
pub trait PartialSource {
    /// `Ok(None)` when no partial with that stem exists.
    fn load_partial(&self, stem: &str) -> Result<Option<RawMap>>;
}

/// Partials stored as `<dir>/<stem>.toml`.
#[derive(Debug, Clone)]
pub struct DirectoryPartialSource {
    dir: PathBuf,
}

impl DirectoryPartialSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PartialSource for DirectoryPartialSource {
    fn load_partial(&self, stem: &str) -> Result<Option<RawMap>> {
        let path = self.dir.join(format!("{stem}.toml"));
        if !path.is_file() {
            return Ok(None);
        }
        load_definition_file(&path).map(Some)
    }
}

/// Replace the `$$split$$` marker of `raw` with the entries of its partials.
///
/// Base entries keep their order and come first, followed by partial
/// entries in keyword order. A missing or empty partial is fatal, as is any
/// key defined twice across the base map and the partials.
pub fn resolve_split(name: &str, raw: RawMap, source: &dyn PartialSource) -> Result<RawMap> {
    let keywords: Vec<String> = match raw.get(SPLIT_KEY) {
        Some(marker) => marker.as_map(SPLIT_KEY)?.keys().cloned().collect(),
        None => return Ok(raw),
    };

    let mut merged: RawMap = raw
        .into_iter()
        .filter(|(key, _)| key != SPLIT_KEY)
        .collect();
    let mut origins = vec!["base definition".to_string(); merged.len()];

    for keyword in &keywords {
        let stem = format!("{name}_{keyword}");
        let partial = match source.load_partial(&stem)? {
            Some(partial) if !partial.is_empty() => partial,
            _ => return Err(ClassificationError::MissingSplitFile { file: stem }),
        };
        debug!(partial = %stem, entries = partial.len(), "merging split definition");
        for (key, node) in partial {
            if let Some(position) = merged.get_index_of(&key) {
                return Err(ClassificationError::SplitKeyCollision {
                    name: name.to_string(),
                    key,
                    location: origins[position].clone(),
                });
            }
            merged.insert(key, node);
            origins.push(format!("partial {stem}"));
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::raw::{RawNode, parse_definition_str};

    #[derive(Default)]
    struct MemorySource {
        partials: HashMap<String, String>,
    }

    impl MemorySource {
        fn with(mut self, stem: &str, toml: &str) -> Self {
            self.partials.insert(stem.to_string(), toml.to_string());
            self
        }
    }

    impl PartialSource for MemorySource {
        fn load_partial(&self, stem: &str) -> Result<Option<RawMap>> {
            self.partials
                .get(stem)
                .map(|text| parse_definition_str(text, Path::new(stem)))
                .transpose()
        }
    }

    fn base(toml: &str) -> RawMap {
        parse_definition_str(toml, Path::new("base.toml")).expect("base")
    }

    #[test]
    fn no_marker_returns_map_unchanged() {
        let raw = base("[[Flg]]\ncode = \"1\"\nname = \"True\"\n");
        let resolved = resolve_split("defs", raw.clone(), &MemorySource::default()).expect("resolve");
        assert_eq!(resolved, raw);
    }

    #[test]
    fn base_entries_come_before_partials_in_keyword_order() {
        let raw = base(
            "[[Flg]]\ncode = \"1\"\nname = \"True\"\n\n[\"$$split$$\"]\nmember = \"\"\norder = \"\"\n",
        );
        let source = MemorySource::default()
            .with("defs_order", "[[OrderStatus]]\ncode = \"A\"\nname = \"Accepted\"\n")
            .with("defs_member", "[[MemberStatus]]\ncode = \"F\"\nname = \"Formal\"\n");
        let resolved = resolve_split("defs", raw, &source).expect("resolve");
        let keys: Vec<&str> = resolved.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Flg", "MemberStatus", "OrderStatus"]);
        assert!(matches!(resolved["OrderStatus"], RawNode::List(_)));
    }

    #[test]
    fn missing_and_empty_partials_are_fatal() {
        let raw = base("[\"$$split$$\"]\norder = \"\"\n");
        let error = resolve_split("defs", raw.clone(), &MemorySource::default()).unwrap_err();
        assert!(matches!(error, ClassificationError::MissingSplitFile { ref file } if file == "defs_order"));

        let source = MemorySource::default().with("defs_order", "");
        let error = resolve_split("defs", raw, &source).unwrap_err();
        assert!(matches!(error, ClassificationError::MissingSplitFile { .. }));
    }

    #[test]
    fn collisions_with_base_and_across_partials_are_fatal() {
        let raw = base("[[Flg]]\ncode = \"1\"\nname = \"True\"\n\n[\"$$split$$\"]\norder = \"\"\n");
        let source = MemorySource::default().with("defs_order", "[[Flg]]\ncode = \"0\"\nname = \"False\"\n");
        let error = resolve_split("defs", raw, &source).unwrap_err();
        match error {
            ClassificationError::SplitKeyCollision { key, location, .. } => {
                assert_eq!(key, "Flg");
                assert_eq!(location, "base definition");
            }
            other => panic!("unexpected error: {other}"),
        }

        let raw = base("[\"$$split$$\"]\na = \"\"\nb = \"\"\n");
        let source = MemorySource::default()
            .with("defs_a", "[[Flg]]\ncode = \"1\"\nname = \"True\"\n")
            .with("defs_b", "[[Flg]]\ncode = \"0\"\nname = \"False\"\n");
        let error = resolve_split("defs", raw, &source).unwrap_err();
        assert!(error.to_string().contains("partial defs_a"));
    }
}

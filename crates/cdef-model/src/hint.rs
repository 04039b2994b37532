//! Hint patterns used as deployment keys.
//!
//! | key             | matches                                  |
//! |-----------------|------------------------------------------|
//! | `MEMBER_STATUS` | exactly that name (case-insensitive)     |
//! | `prefix:IS_`    | names starting with `IS_`                |
//! | `suffix:_FLG`   | names ending with `_FLG`                 |
//! | `contain:CODE`  | names containing `CODE`                  |
//! | `type:CHAR`     | columns whose database type is `CHAR`    |
//! | `$$ALL$$`       | every name                               |

use std::fmt;
use std::sync::Arc;

/// Deployment key meaning "all tables" or "every column".
pub const WILDCARD: &str = "$$ALL$$";

const PREFIX: &str = "prefix:";
const SUFFIX: &str = "suffix:";
const CONTAIN: &str = "contain:";
const TYPE: &str = "type:";

/// A table or column to test against a hint.
#[derive(Debug, Clone, Copy)]
pub struct HintCandidate<'a> {
    pub name: &'a str,
    pub db_type: Option<&'a str>,
}

impl<'a> HintCandidate<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name,
            db_type: None,
        }
    }

    pub fn typed(name: &'a str, db_type: Option<&'a str>) -> Self {
        Self { name, db_type }
    }
}

pub trait HintMatcher: fmt::Debug + Send + Sync {
    fn matches(&self, candidate: &HintCandidate<'_>) -> bool;
}

pub type SharedMatcher = Arc<dyn HintMatcher>;

#[derive(Debug)]
struct ExactHint(String);

#[derive(Debug)]
struct PrefixHint(String);

#[derive(Debug)]
struct SuffixHint(String);

#[derive(Debug)]
struct ContainHint(String);

#[derive(Debug)]
struct TypeHint(String);

#[derive(Debug)]
struct EveryHint;

impl HintMatcher for ExactHint {
    fn matches(&self, candidate: &HintCandidate<'_>) -> bool {
        candidate.name.to_uppercase() == self.0
    }
}

impl HintMatcher for PrefixHint {
    fn matches(&self, candidate: &HintCandidate<'_>) -> bool {
        candidate.name.to_uppercase().starts_with(&self.0)
    }
}

impl HintMatcher for SuffixHint {
    fn matches(&self, candidate: &HintCandidate<'_>) -> bool {
        candidate.name.to_uppercase().ends_with(&self.0)
    }
}

impl HintMatcher for ContainHint {
    fn matches(&self, candidate: &HintCandidate<'_>) -> bool {
        candidate.name.to_uppercase().contains(&self.0)
    }
}

impl HintMatcher for TypeHint {
    fn matches(&self, candidate: &HintCandidate<'_>) -> bool {
        candidate
            .db_type
            .is_some_and(|db_type| db_type.trim().to_uppercase() == self.0)
    }
}

impl HintMatcher for EveryHint {
    fn matches(&self, _candidate: &HintCandidate<'_>) -> bool {
        true
    }
}

/// True when the key is a pattern rather than a plain name.
pub fn is_pattern_key(key: &str) -> bool {
    let key = key.trim();
    key == WILDCARD || [PREFIX, SUFFIX, CONTAIN, TYPE].iter().any(|p| has_marker(key, p))
}

/// Compile a deployment key into a matcher.
pub fn compile_hint(key: &str) -> SharedMatcher {
    let key = key.trim();
    if key == WILDCARD {
        return Arc::new(EveryHint);
    }
    if let Some(rest) = strip_marker(key, PREFIX) {
        return Arc::new(PrefixHint(rest));
    }
    if let Some(rest) = strip_marker(key, SUFFIX) {
        return Arc::new(SuffixHint(rest));
    }
    if let Some(rest) = strip_marker(key, CONTAIN) {
        return Arc::new(ContainHint(rest));
    }
    if let Some(rest) = strip_marker(key, TYPE) {
        return Arc::new(TypeHint(rest));
    }
    Arc::new(ExactHint(key.to_uppercase()))
}

fn has_marker(key: &str, marker: &str) -> bool {
    key.len() > marker.len()
        && key.is_char_boundary(marker.len())
        && key[..marker.len()].eq_ignore_ascii_case(marker)
}

fn strip_marker(key: &str, marker: &str) -> Option<String> {
    has_marker(key, marker).then(|| key[marker.len()..].trim().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(key: &str, name: &str) -> bool {
        compile_hint(key).matches(&HintCandidate::named(name))
    }

    #[test]
    fn name_hints() {
        assert!(hit("prefix:IS_", "is_active"));
        assert!(!hit("prefix:IS_", "THIS_IS"));
        assert!(hit("suffix:_FLG", "DELETE_FLG"));
        assert!(hit("contain:STATUS", "MEMBER_STATUS_CODE"));
        assert!(hit("member_status", "MEMBER_STATUS"));
        assert!(hit(WILDCARD, "ANYTHING"));
    }

    #[test]
    fn type_hint_needs_a_type() {
        let matcher = compile_hint("type:CHAR");
        assert!(matcher.matches(&HintCandidate::typed("FLG", Some("char"))));
        assert!(!matcher.matches(&HintCandidate::named("FLG")));
    }

    #[test]
    fn bare_marker_is_a_plain_name() {
        assert!(!is_pattern_key("prefix:"));
        assert!(is_pattern_key("Suffix:_FLG"));
        assert!(!is_pattern_key("DELETE_FLG"));
    }
}

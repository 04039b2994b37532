use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Fold a table or column name into its lookup key.
pub fn fold_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Insertion-ordered map with case-insensitive keys.
///
/// Keys are folded for lookup while the first spelling seen is kept for
/// display and serialization.
#[derive(Clone, PartialEq, Eq)]
pub struct FlexibleMap<V> {
    entries: IndexMap<String, (String, V)>,
}

impl<V> FlexibleMap<V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold_key(key))
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&fold_key(key)).map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .get_mut(&fold_key(key))
            .map(|(_, value)| value)
    }

    /// Original spelling of a stored key.
    pub fn original_key(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&fold_key(key))
            .map(|(original, _)| original.as_str())
    }

    /// Insert or replace, keeping the position and spelling of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.entry(fold_key(&key)) {
            Entry::Occupied(mut occupied) => {
                Some(std::mem::replace(&mut occupied.get_mut().1, value))
            }
            Entry::Vacant(vacant) => {
                vacant.insert((key, value));
                None
            }
        }
    }

    /// Insert only when the key is absent. Returns true when inserted.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        match self.entries.entry(fold_key(&key)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert((key, value));
                true
            }
        }
    }

    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
        &mut self
            .entries
            .entry(fold_key(key))
            .or_insert_with(|| (key.to_string(), make()))
            .1
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries
            .shift_remove(&fold_key(key))
            .map(|(_, value)| value)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &V) -> bool) {
        self.entries
            .retain(|_, (original, value)| keep(original, value));
    }

    /// Entries in insertion order with their original key spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .values()
            .map(|(original, value)| (original.as_str(), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.entries
            .values_mut()
            .map(|(original, value)| (original.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(original, _)| original.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, value)| value)
    }
}

impl<V> Default for FlexibleMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for FlexibleMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: Serialize> Serialize for FlexibleMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for FlexibleMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_and_keep_first_spelling() {
        let mut map = FlexibleMap::new();
        map.insert("Member_Status", 1);
        assert_eq!(map.get("MEMBER_STATUS"), Some(&1));
        assert_eq!(map.insert("member_status", 2), Some(1));
        assert_eq!(map.original_key("MEMBER_STATUS"), Some("Member_Status"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_if_absent_never_overwrites() {
        let mut map = FlexibleMap::new();
        assert!(map.insert_if_absent("A", "first"));
        assert!(!map.insert_if_absent("a", "second"));
        assert_eq!(map.get("A"), Some(&"first"));
    }
}

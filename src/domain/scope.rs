// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name scope for expression evaluation.
//!
//! A `Scope` is an insertion-ordered map from option name to raw string value.
//! The store builds one per read from the defaults section overlaid by the
//! section being read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An insertion-ordered mapping from names to string values.
///
/// Inserting an existing name replaces its value in place and keeps its original
/// position.
///
/// # Examples
///
/// ```
/// use interpcfg::domain::Scope;
///
/// let defaults: Scope = [("a", "1"), ("b", "2")].into_iter().collect();
/// let section: Scope = [("b", "20"), ("c", "30")].into_iter().collect();
///
/// let scope = Scope::layered(&defaults, &section);
/// assert_eq!(scope.get("a"), Some("1"));
/// assert_eq!(scope.get("b"), Some("20"));
/// assert_eq!(scope.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    entries: IndexMap<String, String>,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the scope for one read: `base` first, then `overlay`, with
    /// `overlay` winning on name collisions.
    pub fn layered(base: &Scope, overlay: &Scope) -> Self {
        let mut scope = base.clone();
        scope.entries.extend(
            overlay
                .entries
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        scope
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), value.into())
    }

    /// Removes a value, returning it if it was present. Later names keep their order.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    /// Looks up a value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns `true` if the name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no names are bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<Vec<(String, String)>> for Scope {
    fn from(entries: Vec<(String, String)>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<Scope> for Vec<(String, String)> {
    fn from(scope: Scope) -> Self {
        scope.entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut scope = Scope::new();
        assert!(scope.is_empty());
        assert_eq!(scope.insert("a", "1"), None);
        assert_eq!(scope.get("a"), Some("1"));
        assert_eq!(scope.get("b"), None);
        assert!(scope.contains("a"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut scope: Scope = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(scope.insert("a", "10"), Some("1".to_string()));
        let names: Vec<_> = scope.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(scope.get("a"), Some("10"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut scope: Scope = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        assert_eq!(scope.remove("a"), Some("1".to_string()));
        assert_eq!(scope.remove("a"), None);
        assert_eq!(scope.get("b"), Some("2"));
        assert_eq!(scope.get("c"), Some("3"));
        let names: Vec<_> = scope.names().collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_layered_precedence_and_order() {
        let defaults: Scope = [("a", "pi"), ("title", "t")].into_iter().collect();
        let section: Scope = [("b", "0"), ("a", "4")].into_iter().collect();
        let scope = Scope::layered(&defaults, &section);

        assert_eq!(scope.get("a"), Some("4"));
        assert_eq!(scope.get("b"), Some("0"));
        let names: Vec<_> = scope.names().collect();
        assert_eq!(names, vec!["a", "title", "b"]);
    }

    #[test]
    fn test_layered_does_not_touch_inputs() {
        let defaults: Scope = [("a", "1")].into_iter().collect();
        let section: Scope = [("a", "2")].into_iter().collect();
        let _ = Scope::layered(&defaults, &section);
        assert_eq!(defaults.get("a"), Some("1"));
        assert_eq!(section.get("a"), Some("2"));
    }

    #[test]
    #[cfg(feature = "yaml")]
    fn test_serde_as_ordered_mapping() {
        let scope: Scope = [("b", "x"), ("a", "y")].into_iter().collect();
        let yaml = serde_yaml::to_string(&scope).unwrap();
        assert_eq!(yaml, "b: x\na: y\n");

        let back: Scope = serde_yaml::from_str(&yaml).unwrap();
        let names: Vec<_> = back.names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_vec_conversion() {
        let scope = Scope::from(vec![("x".to_string(), "y".to_string())]);
        let back: Vec<(String, String)> = scope.into();
        assert_eq!(back, vec![("x".to_string(), "y".to_string())]);
    }
}

//! Materialized ancestor chain of a location node.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::path_codec;

/// Ordered ancestor placenames, root first, excluding the node's own name.
///
/// An empty path means the node is top-level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyPath(Vec<String>);

impl HierarchyPath {
    /// The path of a top-level node.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse the ancestor chain out of a compound name (everything but the leaf).
    pub fn from_compound_name(compound_name: &str) -> Self {
        let mut segments = path_codec::decode(compound_name);
        segments.pop();
        Self(segments)
    }

    pub fn is_top_level(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ancestors. Also the index at which the node's own
    /// placename appears in each of its descendants' paths.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Placename of the direct parent.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn contains(&self, placename: &str) -> bool {
        self.0.iter().any(|s| s == placename)
    }

    /// Path a direct child of `placename` at this path would carry.
    pub fn child(&self, placename: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(placename.to_string());
        Self(segments)
    }

    /// Whether `prefix` is a leading sub-sequence of this path.
    pub fn starts_with(&self, prefix: &HierarchyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// `self ++ tail`
    pub fn join(&self, tail: &[String]) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + tail.len());
        segments.extend_from_slice(&self.0);
        segments.extend_from_slice(tail);
        Self(segments)
    }

    /// Compound name of a node at this path named `placename`.
    pub fn compound_name(&self, placename: &str) -> String {
        path_codec::encode(&self.0, placename)
    }

    /// Compound name of the direct parent, if any.
    pub fn parent_compound_name(&self) -> Option<String> {
        let (last, rest) = self.0.split_last()?;
        Some(path_codec::encode(rest, last))
    }

    /// Compound names of every ancestor, root first.
    pub fn ancestor_prefixes(&self) -> Vec<String> {
        path_codec::ancestor_prefixes(&self.0)
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<Vec<String>> for HierarchyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<Vec<&str>> for HierarchyPath {
    fn from(segments: Vec<&str>) -> Self {
        Self(segments.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_compound_name_drops_nothing_but_self() {
        let path = HierarchyPath::from(vec!["Sierra Leone", "Bo"]);
        assert_eq!(path.parent_compound_name().as_deref(), Some("Sierra Leone::Bo"));
        assert_eq!(HierarchyPath::root().parent_compound_name(), None);
    }

    #[test]
    fn from_compound_name_strips_leaf() {
        let path = HierarchyPath::from_compound_name("Sierra Leone::Bo::Bo Town");
        assert_eq!(path, HierarchyPath::from(vec!["Sierra Leone", "Bo"]));
        assert!(HierarchyPath::from_compound_name("Sierra Leone").is_top_level());
    }

    #[test]
    fn child_extends_path() {
        let child = HierarchyPath::from(vec!["Sierra Leone"]).child("Bo");
        assert_eq!(child, HierarchyPath::from(vec!["Sierra Leone", "Bo"]));
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn starts_with_matches_prefixes_only() {
        let path = HierarchyPath::from(vec!["Sierra Leone", "Bo", "Bo Town"]);
        assert!(path.starts_with(&HierarchyPath::from(vec!["Sierra Leone", "Bo"])));
        assert!(path.starts_with(&HierarchyPath::root()));
        assert!(!path.starts_with(&HierarchyPath::from(vec!["Bo"])));
    }

    #[test]
    fn serializes_as_plain_array() {
        let path = HierarchyPath::from(vec!["Sierra Leone", "Bo"]);
        let json = serde_json::to_string(&path).expect("serialize");
        assert_eq!(json, r#"["Sierra Leone","Bo"]"#);
    }
}

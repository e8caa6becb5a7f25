//! Visitor over the document tree
//!
//! Documents are a tagged union of mapping, sequence and scalar nodes.
//! [`walk`] drives a read-only [`Visitor`] that sees every mapping with its
//! path; [`walk_mut`] drives a [`VisitorMut`] that sees every mapping entry
//! and may rewrite the value in place.

use crate::path::NodePath;
use serde_json::{Map, Value};

/// Borrowed view of one node
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// Key/value mapping
    Mapping(&'a Map<String, Value>),
    /// Ordered sequence
    Sequence(&'a [Value]),
    /// String, number, boolean or null
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    /// Classify a value
    #[inline]
    #[must_use]
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::Array(items) => Self::Sequence(items),
            scalar => Self::Scalar(scalar),
        }
    }
}

/// Mutably borrowed view of one node
#[derive(Debug)]
pub enum NodeMut<'a> {
    /// Key/value mapping
    Mapping(&'a mut Map<String, Value>),
    /// Ordered sequence
    Sequence(&'a mut Vec<Value>),
    /// String, number, boolean or null
    Scalar(&'a mut Value),
}

impl<'a> NodeMut<'a> {
    /// Classify a value
    #[inline]
    #[must_use]
    pub fn of(value: &'a mut Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::Array(items) => Self::Sequence(items),
            scalar => Self::Scalar(scalar),
        }
    }
}

/// Whether traversal continues below the current node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    /// Visit children
    Into,
    /// Leave the subtree alone
    Skip,
}

/// Read-only visitor called once per mapping, top-down
pub trait Visitor {
    /// Error that aborts the walk
    type Error;

    /// Inspect a mapping at `path`
    ///
    /// # Errors
    /// Any error stops the walk and is returned from [`walk`]
    fn visit_mapping(
        &mut self,
        path: &NodePath,
        map: &Map<String, Value>,
    ) -> Result<Descend, Self::Error>;
}

/// Mutating visitor called once per mapping entry, top-down
pub trait VisitorMut {
    /// Inspect and possibly rewrite the value stored under `key`
    fn visit_entry(&mut self, key: &str, value: &mut Value) -> Descend;
}

/// Walk `value` top-down, mapping values and sequence elements in order
///
/// # Errors
/// Returns the first error produced by the visitor
pub fn walk<V: Visitor>(value: &Value, visitor: &mut V) -> Result<(), V::Error> {
    walk_at(value, &NodePath::root(), visitor)
}

/// Walk a subtree whose root sits at `path`
///
/// # Errors
/// Returns the first error produced by the visitor
pub fn walk_at<V: Visitor>(
    value: &Value,
    path: &NodePath,
    visitor: &mut V,
) -> Result<(), V::Error> {
    match Node::of(value) {
        Node::Mapping(map) => {
            if visitor.visit_mapping(path, map)? == Descend::Skip {
                return Ok(());
            }
            for (key, child) in map {
                walk_at(child, &path.key(key), visitor)?;
            }
        }
        Node::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                walk_at(item, &path.index(index), visitor)?;
            }
        }
        Node::Scalar(_) => {}
    }
    Ok(())
}

/// Walk `value` top-down, letting the visitor rewrite entries in place
pub fn walk_mut<V: VisitorMut>(value: &mut Value, visitor: &mut V) {
    match NodeMut::of(value) {
        NodeMut::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                if visitor.visit_entry(key, child) == Descend::Into {
                    walk_mut(child, visitor);
                }
            }
        }
        NodeMut::Sequence(items) => {
            for item in items.iter_mut() {
                walk_mut(item, visitor);
            }
        }
        NodeMut::Scalar(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Collect {
        paths: Vec<String>,
        stop_at: Option<&'static str>,
    }

    impl Visitor for Collect {
        type Error = String;

        fn visit_mapping(
            &mut self,
            path: &NodePath,
            map: &Map<String, Value>,
        ) -> Result<Descend, String> {
            if map.contains_key("boom") {
                return Err(path.to_pointer());
            }
            self.paths.push(path.to_pointer());
            if self.stop_at.is_some_and(|key| map.contains_key(key)) {
                return Ok(Descend::Skip);
            }
            Ok(Descend::Into)
        }
    }

    #[test]
    fn visits_mappings_in_document_order() {
        let value = json!({"a": {"b": [{"c": 1}, 2, {"d": {}}]}});
        let mut visitor = Collect { paths: Vec::new(), stop_at: None };
        walk(&value, &mut visitor).unwrap();
        assert_eq!(visitor.paths, vec!["", "/a", "/a/b/0", "/a/b/2", "/a/b/2/d"]);
    }

    #[test]
    fn skip_prunes_subtree() {
        let value = json!({"a": {"stop": true, "inner": {"x": 1}}, "b": {}});
        let mut visitor = Collect { paths: Vec::new(), stop_at: Some("stop") };
        walk(&value, &mut visitor).unwrap();
        assert_eq!(visitor.paths, vec!["", "/a", "/b"]);
    }

    #[test]
    fn error_aborts_walk() {
        let value = json!({"a": [{"boom": 1}], "b": {}});
        let mut visitor = Collect { paths: Vec::new(), stop_at: None };
        assert_eq!(walk(&value, &mut visitor), Err("/a/0".to_string()));
    }

    struct Upper;

    impl VisitorMut for Upper {
        fn visit_entry(&mut self, key: &str, value: &mut Value) -> Descend {
            if key == "frozen" {
                return Descend::Skip;
            }
            if let Value::String(s) = value {
                *s = s.to_uppercase();
            }
            Descend::Into
        }
    }

    #[test]
    fn walk_mut_rewrites_entries() {
        let mut value = json!({"a": "x", "list": [{"b": "y"}], "frozen": {"c": "z"}});
        walk_mut(&mut value, &mut Upper);
        assert_eq!(value, json!({"a": "X", "list": [{"b": "Y"}], "frozen": {"c": "z"}}));
    }
}

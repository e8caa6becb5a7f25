//! Structural document diff
//!
//! Compares two documents node by node and lists the leaves that differ,
//! addressed by JSON pointer. Used to decide whether a push is needed at
//! all and to show reviewers what a run would change.

use crate::document::Document;
use crate::path::NodePath;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// One differing node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    /// JSON pointer of the node
    pub pointer: String,
    /// Value before, `None` if added
    pub before: Option<Value>,
    /// Value after, `None` if removed
    pub after: Option<Value>,
}

impl Display for Change {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => write!(f, "~ {}: {} -> {}", self.pointer, before, after),
            (None, Some(after)) => write!(f, "+ {}: {}", self.pointer, after),
            (Some(before), None) => write!(f, "- {}: {}", self.pointer, before),
            (None, None) => write!(f, "  {}", self.pointer),
        }
    }
}

/// Changes between two documents, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Delta {
    /// Differing nodes
    pub changes: Vec<Change>,
}

impl Delta {
    /// Check if the documents are identical
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Diff two documents
#[must_use]
pub fn diff(original: &Document, modified: &Document) -> Delta {
    let mut delta = Delta::default();
    diff_values(&NodePath::root(), original.root(), modified.root(), &mut delta.changes);
    delta
}

fn diff_values(path: &NodePath, before: &Value, after: &Value, out: &mut Vec<Change>) {
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, old) in a {
                match b.get(key) {
                    Some(new) => diff_values(&path.key(key), old, new, out),
                    None => out.push(change(path.key(key), Some(old), None)),
                }
            }
            for (key, new) in b {
                if !a.contains_key(key) {
                    out.push(change(path.key(key), None, Some(new)));
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for index in 0..a.len().max(b.len()) {
                match (a.get(index), b.get(index)) {
                    (Some(old), Some(new)) => diff_values(&path.index(index), old, new, out),
                    (old, new) => out.push(change(path.index(index), old, new)),
                }
            }
        }
        _ if before == after => {}
        _ => out.push(change(path.clone(), Some(before), Some(after))),
    }
}

fn change(path: NodePath, before: Option<&Value>, after: Option<&Value>) -> Change {
    Change {
        pointer: path.to_pointer(),
        before: before.cloned(),
        after: after.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn identical_documents_have_empty_delta() {
        let a = doc(json!({"widgets": [{"fieldName": "a"}], "version": 1}));
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn reports_leaf_changes() {
        let a = doc(json!({"widgets": [{"fieldName": "POP", "text": "x"}]}));
        let b = doc(json!({"widgets": [{"fieldName": "pop", "text": "x"}]}));
        let delta = diff(&a, &b);
        assert_eq!(
            delta.changes,
            vec![Change {
                pointer: "/widgets/0/fieldName".into(),
                before: Some(json!("POP")),
                after: Some(json!("pop")),
            }]
        );
        assert_eq!(delta.changes[0].to_string(), r#"~ /widgets/0/fieldName: "POP" -> "pop""#);
    }

    #[test]
    fn reports_added_and_removed() {
        let a = doc(json!({"a": 1, "list": [1, 2]}));
        let b = doc(json!({"b": 2, "list": [1]}));
        let pointers: Vec<_> = diff(&a, &b).changes.into_iter().map(|c| c.pointer).collect();
        assert_eq!(pointers, vec!["/a", "/list/1", "/b"]);
    }

    #[test]
    fn type_change_is_one_change() {
        let a = doc(json!({"a": {"x": 1}}));
        let b = doc(json!({"a": [1]}));
        assert_eq!(diff(&a, &b).len(), 1);
    }
}

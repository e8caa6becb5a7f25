//! Node paths for addressing within documents
//!
//! Provides [`NodePath`], a segment list that renders as an RFC 6901 JSON
//! pointer so located scopes can be revisited with `Value::pointer_mut`.

use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// Path from the document root to a node
///
/// # Examples
/// - `[]` → `""` (root)
/// - `["widgets", "0", "dataSource"]` → `/widgets/0/dataSource`
/// - `["a/b", "c~d"]` → `/a~1b/c~0d`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a mapping key, returning new path
    #[inline]
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        let mut new = self.clone();
        new.0.push(key.to_string());
        new
    }

    /// Append a sequence index, returning new path
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(index.to_string());
        new
    }

    /// Render as a JSON pointer
    #[must_use]
    pub fn to_pointer(&self) -> String {
        self.to_string()
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

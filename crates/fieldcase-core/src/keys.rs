//! Key classification table
//!
//! Maps mapping keys to the way their value encodes field references.
//! Supporting a new key is a table edit, not new control flow.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved `valueField` payload meaning "use the absolute value"
pub const ABSOLUTE_VALUE_SENTINEL: &str = "absoluteValue";

/// How a key's value refers to fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCategory {
    /// Whole string value is one field name
    Field,
    /// Sequence of field names
    FieldList,
    /// Sequence of `"<field> <direction>"` entries
    Ordering,
    /// Prose embedding `{field}` or `{field/NAME}` tokens
    Template,
    /// Script or expression body; every whole identifier is a candidate
    Expression,
    /// Mapping whose `name` entry holds the field (or a bare field string)
    FieldObject,
}

const DEFAULT_KEYS: &[(&str, KeyCategory)] = &[
    ("fieldName", KeyCategory::Field),
    ("onStatisticField", KeyCategory::Field),
    ("valueField", KeyCategory::Field),
    ("sourceName", KeyCategory::Field),
    ("targetName", KeyCategory::Field),
    ("categoryField", KeyCategory::Field),
    ("splitByField", KeyCategory::Field),
    ("labelField", KeyCategory::Field),
    ("groupByFields", KeyCategory::FieldList),
    ("valueFields", KeyCategory::FieldList),
    ("outFields", KeyCategory::FieldList),
    ("orderByFields", KeyCategory::Ordering),
    ("seriesOrderByFields", KeyCategory::Ordering),
    ("text", KeyCategory::Template),
    ("title", KeyCategory::Template),
    ("description", KeyCategory::Template),
    ("expression", KeyCategory::Expression),
    ("script", KeyCategory::Expression),
    ("labelExpression", KeyCategory::Expression),
    ("field", KeyCategory::FieldObject),
];

static DEFAULT_TABLE: Lazy<HashMap<String, KeyCategory>> = Lazy::new(|| {
    DEFAULT_KEYS
        .iter()
        .map(|(key, category)| ((*key).to_string(), *category))
        .collect()
});

/// Registry of recognized keys
///
/// Keys are matched exactly (dashboard keys are camelCase and stable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTable {
    keys: HashMap<String, KeyCategory>,
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl KeyTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Create table with the built-in dashboard keys
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            keys: DEFAULT_TABLE.clone(),
        }
    }

    /// Register (or reclassify) a key
    pub fn register(&mut self, key: impl Into<String>, category: KeyCategory) {
        self.keys.insert(key.into(), category);
    }

    /// Builder form of [`KeyTable::register`]
    #[inline]
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, category: KeyCategory) -> Self {
        self.register(key, category);
        self
    }

    /// Remove a key, returning its previous category
    pub fn remove(&mut self, key: &str) -> Option<KeyCategory> {
        self.keys.remove(key)
    }

    /// Category of `key`, if recognized
    #[inline]
    #[must_use]
    pub fn category(&self, key: &str) -> Option<KeyCategory> {
        self.keys.get(key).copied()
    }

    /// Number of recognized keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no keys are recognized
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Recognized keys of one category, sorted
    #[must_use]
    pub fn keys_of(&self, category: KeyCategory) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .keys
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(k, _)| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

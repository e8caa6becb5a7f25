//! Dashboard configuration documents
//!
//! Uses serde_json for parsing; key order is preserved so an unchanged
//! document serializes back byte-identically.

use crate::error::{MigrationError, MigrationResult};
use serde_json::Value;
use std::str::FromStr;

/// Untyped dashboard configuration tree
///
/// The root must be a mapping. Nothing else about the shape is assumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Parse document text
    ///
    /// # Errors
    /// `MigrationError::MalformedDocument` for invalid JSON or a non-mapping root
    pub fn parse(text: &str) -> MigrationResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| MigrationError::malformed(format!("JSON parse error: {e}")))?;
        Self::from_value(value)
    }

    /// Wrap an already parsed value
    ///
    /// # Errors
    /// `MigrationError::MalformedDocument` if the root is not a mapping
    pub fn from_value(value: Value) -> MigrationResult<Self> {
        if !value.is_object() {
            return Err(MigrationError::malformed(format!(
                "document root must be a mapping, got {}",
                kind_of(&value)
            )));
        }
        Ok(Self { root: value })
    }

    /// Root value
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Mutable root value
    #[inline]
    pub(crate) fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Get value at a JSON pointer
    #[inline]
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    /// Compact JSON text, as uploaded
    ///
    /// # Errors
    /// Propagates serializer failures as `MalformedDocument`
    pub fn to_json(&self) -> MigrationResult<String> {
        serde_json::to_string(&self.root).map_err(|e| MigrationError::malformed(e.to_string()))
    }

    /// Indented JSON text, for backups and review
    ///
    /// # Errors
    /// Propagates serializer failures as `MalformedDocument`
    pub fn to_pretty_json(&self) -> MigrationResult<String> {
        serde_json::to_string_pretty(&self.root)
            .map_err(|e| MigrationError::malformed(e.to_string()))
    }
}

impl FromStr for Document {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Value> for Document {
    type Error = MigrationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

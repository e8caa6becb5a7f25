//! Datasource retargeting
//!
//! Optionally re-points the `itemDataSource` descriptors of bound scopes at
//! a replacement dataset. Planned before any mutation: a descriptor that
//! addresses a different layer of the target aborts the run, since only the
//! migrated layer's schema is known to match the replacement.

use crate::document::Document;
use crate::error::{MigrationError, MigrationResult};
use crate::path::NodePath;
use crate::scope::{Binding, Scope};
use crate::walk::{walk_at, Descend, Visitor};
use serde_json::{Map, Value};

/// Descriptors to re-point, collected from bound scopes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetargetPlan {
    descriptors: Vec<NodePath>,
}

impl RetargetPlan {
    /// Find every target descriptor inside `scopes`
    ///
    /// # Errors
    /// `MigrationError::LayerMismatch` for a descriptor on another layer
    pub fn build(
        document: &Document,
        scopes: &[Scope],
        target: &str,
        layer: u32,
    ) -> MigrationResult<Self> {
        let mut finder = DescriptorFinder {
            target,
            layer,
            found: Vec::new(),
        };
        for scope in scopes {
            if matches!(scope.binding, Binding::ArcadeScript { .. }) {
                continue;
            }
            if let Some(root) = document.pointer(&scope.path.to_pointer()) {
                walk_at(root, &scope.path, &mut finder)?;
            }
        }
        Ok(Self {
            descriptors: finder.found,
        })
    }

    /// Descriptor locations
    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &[NodePath] {
        &self.descriptors
    }

    /// Check if nothing would be re-pointed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Write `new_id` into every planned descriptor
    ///
    /// Returns the number of descriptors changed.
    pub fn apply(&self, document: &mut Document, new_id: &str) -> usize {
        let mut changed = 0;
        for path in &self.descriptors {
            let pointer = path.to_pointer();
            let Some(Value::Object(descriptor)) = document.root_mut().pointer_mut(&pointer) else {
                continue;
            };
            if descriptor.get("itemId").and_then(Value::as_str) != Some(new_id) {
                descriptor.insert("itemId".to_string(), Value::String(new_id.to_string()));
                changed += 1;
            }
        }
        changed
    }
}

struct DescriptorFinder<'a> {
    target: &'a str,
    layer: u32,
    found: Vec<NodePath>,
}

impl Visitor for DescriptorFinder<'_> {
    type Error = MigrationError;

    fn visit_mapping(
        &mut self,
        path: &NodePath,
        map: &Map<String, Value>,
    ) -> MigrationResult<Descend> {
        let is_target = map.get("type").and_then(Value::as_str) == Some("itemDataSource")
            && map
                .get("itemId")
                .and_then(Value::as_str)
                .is_some_and(|id| id.eq_ignore_ascii_case(self.target));
        if !is_target {
            return Ok(Descend::Into);
        }

        if let Some(found) = map.get("layerId").and_then(Value::as_i64) {
            if found != i64::from(self.layer) {
                return Err(MigrationError::LayerMismatch {
                    pointer: path.to_pointer(),
                    expected: self.layer,
                    found,
                });
            }
        }
        self.found.push(path.clone());
        Ok(Descend::Skip)
    }
}

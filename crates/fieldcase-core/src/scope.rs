//! Scope location
//!
//! Finds the subtrees of a document that are unambiguously bound to one
//! target dataset. Runs in two explicit passes:
//!
//! 1. **Classify** every arcade script in the document: extract the
//!    32-hex-digit identifiers it references, reject scripts naming more
//!    than one dataset, and collect the descriptor ids of scripts naming
//!    exactly the target.
//! 2. **Bind** top-down. At each mapping the mechanisms are tried in fixed
//!    order (direct `itemId`, `dataSource`/`datasets` descriptor, arcade
//!    data source); the first match makes the mapping a scope root and its
//!    subtree is not searched further.
//!
//! Pass 2 only starts once pass 1 has seen the whole document, so binding
//! does not depend on where scripts sit relative to the widgets using them.

use crate::document::Document;
use crate::error::{MigrationError, MigrationResult};
use crate::path::NodePath;
use crate::walk::{walk, Descend, Visitor};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::convert::Infallible;

/// Key holding the arcade script descriptors
pub const ARCADE_ITEMS_KEY: &str = "arcadeDataSourceItems";

const SCRIPT_KEY: &str = "script";
const ITEM_DATA_SOURCE: &str = "itemDataSource";
const ARCADE_DATA_SOURCE: &str = "arcadeDataSource";

static ITEM_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9a-fA-F]{32}\b").expect("item id pattern must compile"));

/// How a scope root was recognized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// Mapping carries `itemId` equal to the target
    ItemId,
    /// `dataSource` of type `itemDataSource` pointing at the target
    DataSource,
    /// Single-entry `datasets` list pointing at the target
    Datasets,
    /// `dataSource` of type `arcadeDataSource` backed by an eligible script,
    /// directly or as the sole `datasets` entry
    ArcadeDataSource {
        /// Descriptor id of the backing script
        script_id: String,
    },
    /// Text of an eligible arcade script
    ArcadeScript {
        /// Descriptor id of the script
        script_id: String,
    },
    /// Entire document (unsafe mode)
    Document,
}

/// A subtree bound to the target dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    /// Location of the scope root
    pub path: NodePath,
    /// Mechanism that bound it
    pub binding: Binding,
}

impl Scope {
    /// Scope covering the whole document
    #[inline]
    #[must_use]
    pub fn whole_document() -> Self {
        Self {
            path: NodePath::root(),
            binding: Binding::Document,
        }
    }
}

/// Arcade script that references exactly the target dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleScript {
    /// Descriptor id (`id`, else `itemId`, else its pointer)
    pub script_id: String,
    /// Location of the script text
    pub text_path: NodePath,
    /// Location of the mapping carrying the script list
    carrier: NodePath,
}

/// Result of the classify pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcadeClassification {
    eligible_ids: HashSet<String>,
    scripts: Vec<EligibleScript>,
}

impl ArcadeClassification {
    /// Check if an arcade data source id is backed by an eligible script
    #[inline]
    #[must_use]
    pub fn is_eligible(&self, descriptor_id: &str) -> bool {
        self.eligible_ids.contains(descriptor_id)
    }
}

/// Locates scopes for one target dataset
#[derive(Debug, Clone)]
pub struct ScopeLocator {
    target: String,
    layer: Option<u32>,
}

impl ScopeLocator {
    /// Create locator for a dataset item id
    #[inline]
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            layer: None,
        }
    }

    /// Warn about bound descriptors naming a different `layerId`
    #[inline]
    #[must_use]
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Run both passes
    ///
    /// # Errors
    /// `MigrationError::AmbiguousScope` if any arcade script references more
    /// than one distinct dataset identifier
    pub fn locate(&self, document: &Document) -> MigrationResult<Vec<Scope>> {
        let classification = self.classify(document)?;
        let scopes = self.bind(document, &classification);
        tracing::debug!(
            "located {} scopes for {} ({} eligible arcade scripts)",
            scopes.len(),
            self.target,
            classification.scripts.len()
        );
        Ok(scopes)
    }

    /// Pass 1: classify every arcade script in the document
    ///
    /// # Errors
    /// `MigrationError::AmbiguousScope` on the first multi-dataset script
    pub fn classify(&self, document: &Document) -> MigrationResult<ArcadeClassification> {
        let mut classifier = Classifier {
            target: &self.target,
            result: ArcadeClassification::default(),
        };
        walk(document.root(), &mut classifier)?;
        Ok(classifier.result)
    }

    /// Pass 2: bind scope roots top-down
    #[must_use]
    pub fn bind(&self, document: &Document, classification: &ArcadeClassification) -> Vec<Scope> {
        let mut by_carrier: HashMap<&NodePath, Vec<&EligibleScript>> = HashMap::new();
        for script in &classification.scripts {
            by_carrier.entry(&script.carrier).or_default().push(script);
        }

        let mut binder = Binder {
            target: &self.target,
            layer: self.layer,
            classification,
            by_carrier,
            scopes: Vec::new(),
        };
        if let Err(never) = walk(document.root(), &mut binder) {
            match never {}
        }
        binder.scopes
    }
}

/// Locate the scopes of `target` in `document`
///
/// # Errors
/// See [`ScopeLocator::locate`]
pub fn locate(document: &Document, target: &str) -> MigrationResult<Vec<Scope>> {
    ScopeLocator::new(target).locate(document)
}

/// Distinct item identifiers referenced by a script, lower-cased
#[must_use]
pub fn referenced_ids(script: &str) -> BTreeSet<String> {
    ITEM_ID_PATTERN
        .find_iter(script)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

struct Classifier<'a> {
    target: &'a str,
    result: ArcadeClassification,
}

impl Visitor for Classifier<'_> {
    type Error = MigrationError;

    fn visit_mapping(
        &mut self,
        path: &NodePath,
        map: &Map<String, Value>,
    ) -> MigrationResult<Descend> {
        let Some(Value::Array(items)) = map.get(ARCADE_ITEMS_KEY) else {
            return Ok(Descend::Into);
        };

        let list_path = path.key(ARCADE_ITEMS_KEY);
        for (index, item) in items.iter().enumerate() {
            let Some(Value::String(text)) = item.get(SCRIPT_KEY) else {
                continue;
            };
            let item_path = list_path.index(index);
            let script_id = descriptor_id(item).unwrap_or_else(|| item_path.to_pointer());
            let ids = referenced_ids(text);

            if ids.len() > 1 {
                return Err(MigrationError::AmbiguousScope {
                    script_id,
                    identifiers: ids.into_iter().collect(),
                });
            }
            if ids.iter().any(|id| id.eq_ignore_ascii_case(self.target)) {
                tracing::debug!("arcade script '{}' references target", script_id);
                self.result.eligible_ids.insert(script_id.clone());
                self.result.scripts.push(EligibleScript {
                    script_id,
                    text_path: item_path.key(SCRIPT_KEY),
                    carrier: path.clone(),
                });
            }
        }
        Ok(Descend::Into)
    }
}

struct Binder<'a> {
    target: &'a str,
    layer: Option<u32>,
    classification: &'a ArcadeClassification,
    by_carrier: HashMap<&'a NodePath, Vec<&'a EligibleScript>>,
    scopes: Vec<Scope>,
}

impl Binder<'_> {
    fn binding_of(&self, path: &NodePath, map: &Map<String, Value>) -> Option<Binding> {
        if str_field(map, "itemId").is_some_and(|id| self.is_target(id)) {
            return Some(Binding::ItemId);
        }

        if let Some(Value::Object(source)) = map.get("dataSource") {
            if str_field(source, "type") == Some(ITEM_DATA_SOURCE)
                && str_field(source, "itemId").is_some_and(|id| self.is_target(id))
            {
                self.check_layer(path, source);
                return Some(Binding::DataSource);
            }
        }

        let sole_dataset = match map.get("datasets") {
            Some(Value::Array(datasets)) => match datasets.as_slice() {
                [only] => only.get("dataSource").and_then(Value::as_object),
                _ => None,
            },
            _ => None,
        };
        if let Some(source) = sole_dataset {
            if str_field(source, "itemId").is_some_and(|id| self.is_target(id)) {
                self.check_layer(path, source);
                return Some(Binding::Datasets);
            }
        }

        let arcade = match map.get("dataSource") {
            Some(Value::Object(source)) => self.eligible_arcade(source),
            _ => None,
        };
        arcade
            .or_else(|| sole_dataset.and_then(|source| self.eligible_arcade(source)))
            .map(|script_id| Binding::ArcadeDataSource { script_id })
    }

    fn is_target(&self, id: &str) -> bool {
        id.eq_ignore_ascii_case(self.target)
    }

    fn eligible_arcade(&self, source: &Map<String, Value>) -> Option<String> {
        if str_field(source, "type") != Some(ARCADE_DATA_SOURCE) {
            return None;
        }
        str_field(source, "itemId")
            .filter(|id| self.classification.is_eligible(id))
            .map(str::to_string)
    }

    fn check_layer(&self, path: &NodePath, source: &Map<String, Value>) {
        let Some(expected) = self.layer else {
            return;
        };
        if let Some(layer) = layer_mismatch(source, expected) {
            tracing::warn!(
                "scope '{}' uses layer {} of {} but is rewritten with layer {} fields",
                path.to_pointer(),
                layer,
                self.target,
                expected
            );
        }
    }
}

/// `layerId` of a descriptor when it names a layer other than `expected`
fn layer_mismatch(source: &Map<String, Value>, expected: u32) -> Option<i64> {
    source
        .get("layerId")
        .and_then(Value::as_i64)
        .filter(|layer| *layer != i64::from(expected))
}

impl Visitor for Binder<'_> {
    type Error = Infallible;

    fn visit_mapping(
        &mut self,
        path: &NodePath,
        map: &Map<String, Value>,
    ) -> Result<Descend, Infallible> {
        if let Some(binding) = self.binding_of(path, map) {
            self.scopes.push(Scope {
                path: path.clone(),
                binding,
            });
            return Ok(Descend::Skip);
        }

        // Scripts under an unbound carrier get their own scope; under a bound
        // one they are rewritten with the enclosing scope.
        if let Some(scripts) = self.by_carrier.get(path) {
            for script in scripts {
                self.scopes.push(Scope {
                    path: script.text_path.clone(),
                    binding: Binding::ArcadeScript {
                        script_id: script.script_id.clone(),
                    },
                });
            }
        }
        Ok(Descend::Into)
    }
}

fn str_field<'m>(map: &'m Map<String, Value>, key: &str) -> Option<&'m str> {
    map.get(key).and_then(Value::as_str)
}

fn descriptor_id(item: &Value) -> Option<String> {
    ["id", "itemId"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

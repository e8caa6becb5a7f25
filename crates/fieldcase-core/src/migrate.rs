//! Rewrite orchestration
//!
//! Composes vocabulary resolution, scope location and reference rewriting
//! into one migration run. The input document is never mutated; all work
//! happens on a copy, so any error leaves the caller with the original.

use crate::collaborator::{DatasetRef, FieldCatalog};
use crate::document::Document;
use crate::error::MigrationResult;
use crate::keys::{KeyCategory, KeyTable};
use crate::retarget::RetargetPlan;
use crate::rewrite::Rewriter;
use crate::scope::{Binding, Scope, ScopeLocator};
use crate::vocabulary::{CasePolicy, Vocabulary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How scopes are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    /// Only subtrees bound to the target dataset are rewritten
    #[default]
    Safe,
    /// Whole document is one scope; for documents known to use one dataset
    Unsafe,
}

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Scope detection mode
    pub mode: ScopeMode,
    /// Casing written back for matched names
    pub case_policy: CasePolicy,
    /// Replacement dataset id for bound `itemDataSource` descriptors
    pub retarget: Option<String>,
    /// Keys recognized in addition to the built-in table
    pub extra_keys: BTreeMap<String, KeyCategory>,
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With scope mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ScopeMode) -> Self {
        self.mode = mode;
        self
    }

    /// With case policy
    #[inline]
    #[must_use]
    pub fn with_case_policy(mut self, policy: CasePolicy) -> Self {
        self.case_policy = policy;
        self
    }

    /// With replacement dataset id
    #[inline]
    #[must_use]
    pub fn with_retarget(mut self, item_id: impl Into<String>) -> Self {
        self.retarget = Some(item_id.into());
        self
    }

    /// With an additional recognized key
    #[inline]
    #[must_use]
    pub fn with_extra_key(mut self, key: impl Into<String>, category: KeyCategory) -> Self {
        self.extra_keys.insert(key.into(), category);
        self
    }
}

/// What happened inside one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeReport {
    /// JSON pointer of the scope root
    pub pointer: String,
    /// Mechanism that bound the scope
    pub binding: Binding,
    /// Number of values rewritten
    pub edits: usize,
}

/// Result of a migration run
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// Migrated copy of the input
    pub document: Document,
    /// Whether any text changed
    pub changed: bool,
    /// Scopes in location order
    pub scopes: Vec<ScopeReport>,
    /// Number of re-pointed data source descriptors
    pub retargeted: usize,
}

impl MigrationOutcome {
    /// Total rewritten values across scopes
    #[must_use]
    pub fn edits(&self) -> usize {
        self.scopes.iter().map(|s| s.edits).sum()
    }
}

/// Runs migrations with one configuration
#[derive(Debug, Clone)]
pub struct Migrator {
    config: MigrationConfig,
    keys: KeyTable,
}

impl Migrator {
    /// Create migrator; `extra_keys` are added to the built-in table
    #[must_use]
    pub fn new(config: MigrationConfig) -> Self {
        let mut keys = KeyTable::with_defaults();
        for (key, category) in &config.extra_keys {
            keys.register(key.clone(), *category);
        }
        Self { config, keys }
    }

    /// Resolve the dataset's vocabulary and migrate `document`
    ///
    /// # Errors
    /// - Collaborator failures from the catalog
    /// - Any error of [`Migrator::migrate_with_vocabulary`]
    pub async fn migrate<C>(
        &self,
        catalog: &C,
        document: &Document,
        dataset: &DatasetRef,
    ) -> MigrationResult<MigrationOutcome>
    where
        C: FieldCatalog + ?Sized,
    {
        let vocabulary = Vocabulary::resolve(catalog, dataset, self.config.case_policy).await?;
        self.migrate_with_vocabulary(document, &vocabulary)
    }

    /// Migrate `document` against an already resolved vocabulary
    ///
    /// # Workflow
    /// 1. Locate scopes (or take the whole document in unsafe mode)
    /// 2. Plan retargeting, failing before any mutation
    /// 3. Rewrite each scope on a copy
    /// 4. Apply retargeting
    ///
    /// # Errors
    /// - `MigrationError::AmbiguousScope` from scope location
    /// - `MigrationError::LayerMismatch` from retarget planning
    pub fn migrate_with_vocabulary(
        &self,
        document: &Document,
        vocabulary: &Vocabulary,
    ) -> MigrationResult<MigrationOutcome> {
        let dataset = vocabulary.dataset();
        let scopes = self.scopes(document, dataset)?;

        let plan = match &self.config.retarget {
            Some(_) => Some(RetargetPlan::build(
                document,
                &scopes,
                &dataset.item_id,
                dataset.layer,
            )?),
            None => None,
        };

        let mut migrated = document.clone();
        let rewriter = Rewriter::new(vocabulary, &self.keys);
        let mut reports = Vec::with_capacity(scopes.len());

        for scope in scopes {
            let pointer = scope.path.to_pointer();
            let Some(node) = migrated.root_mut().pointer_mut(&pointer) else {
                continue;
            };
            let edits = match scope.binding {
                Binding::ArcadeScript { .. } => {
                    rewriter.rewrite_value(KeyCategory::Expression, node)
                }
                _ => rewriter.rewrite(node),
            };
            tracing::debug!("scope '{}' ({:?}): {} edits", pointer, scope.binding, edits);
            reports.push(ScopeReport {
                pointer,
                binding: scope.binding,
                edits,
            });
        }

        let retargeted = match (&plan, &self.config.retarget) {
            (Some(plan), Some(new_id)) => plan.apply(&mut migrated, new_id),
            _ => 0,
        };

        let changed = retargeted > 0 || reports.iter().any(|r| r.edits > 0);
        let outcome = MigrationOutcome {
            document: migrated,
            changed,
            scopes: reports,
            retargeted,
        };
        tracing::info!(
            "migrated dataset {}: {} scopes, {} edits, {} descriptors retargeted",
            dataset,
            outcome.scopes.len(),
            outcome.edits(),
            outcome.retargeted
        );
        Ok(outcome)
    }

    fn scopes(&self, document: &Document, dataset: &DatasetRef) -> MigrationResult<Vec<Scope>> {
        match self.config.mode {
            ScopeMode::Unsafe => {
                tracing::warn!("unsafe mode: rewriting the whole document as one scope");
                Ok(vec![Scope::whole_document()])
            }
            ScopeMode::Safe => {
                let scopes = ScopeLocator::new(dataset.item_id.as_str())
                    .with_layer(dataset.layer)
                    .locate(document)?;
                if scopes.is_empty() {
                    tracing::warn!("no scope in the document references dataset {}", dataset);
                }
                Ok(scopes)
            }
        }
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(MigrationConfig::default())
    }
}

//! Fetch, migrate, push
//!
//! Drives one migration against the collaborators: the document is fetched
//! by id, migrated, diffed against the original, and pushed back only when
//! something changed. A failed push fails the run.

use crate::collaborator::{DatasetRef, DocumentStore, FieldCatalog};
use crate::diff::{diff, Delta};
use crate::document::Document;
use crate::error::MigrationResult;
use crate::migrate::{MigrationOutcome, Migrator};
use std::sync::Arc;

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Migrated document id
    pub item_id: String,
    /// Document as fetched
    pub original: Document,
    /// Migration result
    pub outcome: MigrationOutcome,
    /// Changes between fetched and migrated documents
    pub delta: Delta,
    /// Whether the document was pushed back
    pub pushed: bool,
}

/// Pipeline over a document store and field catalog
pub struct MigrationPipeline<S: ?Sized, C: ?Sized> {
    store: Arc<S>,
    catalog: Arc<C>,
    migrator: Migrator,
}

impl<S, C> MigrationPipeline<S, C>
where
    S: DocumentStore + ?Sized,
    C: FieldCatalog + ?Sized,
{
    /// Create new pipeline
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>, catalog: Arc<C>, migrator: Migrator) -> Self {
        Self {
            store,
            catalog,
            migrator,
        }
    }

    /// Migrate document `item_id` against `dataset`
    ///
    /// With `dry_run` nothing is pushed even if the document changed.
    ///
    /// # Errors
    /// - Collaborator failures from fetch, field lookup or push
    /// - Any migration error; nothing is pushed in that case
    pub async fn run(
        &self,
        item_id: &str,
        dataset: &DatasetRef,
        dry_run: bool,
    ) -> MigrationResult<PipelineReport> {
        tracing::info!("migrating item {} against dataset {}", item_id, dataset);

        let original = self.store.fetch_document(item_id).await?;
        let outcome = self.migrator.migrate(&*self.catalog, &original, dataset).await?;
        let delta = diff(&original, &outcome.document);

        let pushed = if delta.is_empty() {
            tracing::info!("item {} already canonical; nothing to push", item_id);
            false
        } else if dry_run {
            tracing::info!("dry run: {} changes to item {} not pushed", delta.len(), item_id);
            false
        } else {
            self.store.push_document(item_id, &outcome.document).await?;
            tracing::info!("pushed {} changes to item {}", delta.len(), item_id);
            true
        };

        Ok(PipelineReport {
            item_id: item_id.to_string(),
            original,
            outcome,
            delta,
            pushed,
        })
    }
}

impl<S: ?Sized, C: ?Sized> std::fmt::Debug for MigrationPipeline<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationPipeline")
            .field("migrator", &self.migrator)
            .finish_non_exhaustive()
    }
}

//! fieldcase core
//!
//! Scoped field-reference rewrite engine for dashboard configuration
//! documents. Given a document, a target dataset and that dataset's field
//! vocabulary, rewrites every field reference that lives inside a subtree
//! bound to the dataset into canonical casing, and nothing else.
//!
//! # Components
//!
//! - **Vocabulary**: case-insensitive field names of one dataset layer
//! - **Scope locator**: two-pass classify/bind search for bound subtrees
//! - **Rewriter**: key-table driven rewriting inside one scope
//! - **Migrator**: composes the above and reports what changed
//! - **Pipeline**: fetch, migrate, diff and push through collaborators
//!
//! # Architecture
//!
//! ```text
//! FieldCatalog → Vocabulary ─┐
//!                            ├→ Migrator → MigrationOutcome → diff → DocumentStore
//! DocumentStore → Document ──┘     ↑
//!                       ScopeLocator + Rewriter(KeyTable)
//! ```
//!
//! # Example
//!
//! ```rust
//! use fieldcase_core::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), MigrationError> {
//! let dataset = DatasetRef::new("0123456789abcdef0123456789abcdef", 0);
//! let vocabulary = Vocabulary::new(&dataset, ["PopDensity"], CasePolicy::Authoritative)?;
//! let document = Document::from_value(json!({
//!     "widgets": [{
//!         "dataSource": {
//!             "type": "itemDataSource",
//!             "itemId": dataset.item_id.clone(),
//!             "layerId": 0
//!         },
//!         "valueField": "POPDENSITY"
//!     }]
//! }))?;
//!
//! let outcome = Migrator::default().migrate_with_vocabulary(&document, &vocabulary)?;
//! assert!(outcome.changed);
//! assert_eq!(outcome.document.pointer("/widgets/0/valueField"), Some(&json!("PopDensity")));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod collaborator;
pub mod diff;
pub mod document;
pub mod error;
pub mod keys;
pub mod migrate;
pub mod path;
pub mod pipeline;
pub mod retarget;
pub mod rewrite;
pub mod scope;
pub mod vocabulary;
pub mod walk;

// Re-exports for convenience
pub use collaborator::{DatasetRef, DocumentStore, FieldCatalog, FieldInfo};
pub use diff::{diff, Change, Delta};
pub use document::Document;
pub use error::{CollaboratorError, MigrationError, MigrationResult};
pub use keys::{KeyCategory, KeyTable, ABSOLUTE_VALUE_SENTINEL};
pub use migrate::{MigrationConfig, MigrationOutcome, Migrator, ScopeMode, ScopeReport};
pub use path::NodePath;
pub use pipeline::{MigrationPipeline, PipelineReport};
pub use rewrite::{rewrite, Rewriter};
pub use scope::{locate, Binding, Scope, ScopeLocator};
pub use vocabulary::{CasePolicy, Vocabulary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::collaborator::{DatasetRef, DocumentStore, FieldCatalog, FieldInfo};
    pub use crate::document::Document;
    pub use crate::error::{CollaboratorError, MigrationError, MigrationResult};
    pub use crate::keys::{KeyCategory, KeyTable};
    pub use crate::migrate::{MigrationConfig, MigrationOutcome, Migrator, ScopeMode};
    pub use crate::vocabulary::{CasePolicy, Vocabulary};
}

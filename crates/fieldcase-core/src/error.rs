//! Error types for the rewrite engine
//!
//! Every variant aborts the whole migration run:
//! - Vocabulary resolution (empty field list)
//! - Scope location (ambiguous arcade scripts, retarget layer mismatch)
//! - Document parsing
//! - Collaborator failures, propagated unchanged

/// Failures reported by the external collaborators (fetch, lookup, push)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status code
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Remote side answered but refused the operation
    #[error("rejected by remote: {0}")]
    Rejected(String),

    /// Requested item does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

/// Main migration error type
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Field metadata yielded no usable names
    #[error(
        "no usable field names for dataset {dataset_id} layer {layer} \
         (wrong layer number or dataset id?)"
    )]
    VocabularyEmpty {
        /// Dataset item id
        dataset_id: String,
        /// Layer index
        layer: u32,
    },

    /// Arcade script references more than one dataset
    #[error(
        "arcade script '{}' references {} datasets ({}); edit it by hand",
        .script_id,
        .identifiers.len(),
        .identifiers.join(", ")
    )]
    AmbiguousScope {
        /// Identifier of the offending script descriptor
        script_id: String,
        /// Distinct dataset identifiers found in the script text
        identifiers: Vec<String>,
    },

    /// Vocabulary could not be compiled into a matcher
    #[error("cannot compile vocabulary matcher: {0}")]
    InvalidVocabulary(String),

    /// Input is not a usable document tree
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Data source points at another layer of the target dataset
    #[error(
        "data source at '{pointer}' uses layer {found}, expected {expected}; \
         retarget it by hand"
    )]
    LayerMismatch {
        /// JSON pointer of the descriptor
        pointer: String,
        /// Layer the migration runs against
        expected: u32,
        /// Layer found in the descriptor
        found: i64,
    },

    /// External collaborator failed
    #[error("collaborator failed: {0}")]
    Collaborator(#[from] CollaboratorError),
}

impl MigrationError {
    /// Create malformed document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument(message.into())
    }

    /// Create empty vocabulary error
    pub fn vocabulary_empty(dataset_id: impl Into<String>, layer: u32) -> Self {
        Self::VocabularyEmpty {
            dataset_id: dataset_id.into(),
            layer,
        }
    }

    /// Check if the document must be fixed manually before retrying
    #[inline]
    #[must_use]
    pub fn requires_manual_edit(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousScope { .. } | Self::LayerMismatch { .. }
        )
    }
}

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

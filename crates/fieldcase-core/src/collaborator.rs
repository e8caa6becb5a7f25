//! External collaborator contracts
//!
//! The engine never talks to the network itself. Callers hand it
//! implementations of these traits (HTTP in `fieldcase-portal`, in-memory in
//! tests). Implementations must fail loudly: a non-success response is an
//! error, never a partial result, and retries belong to the implementation.

use crate::document::Document;
use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One field of a dataset layer schema
///
/// Only `name` is consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name in authoritative case
    pub name: String,
    /// Display alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Field type, e.g. `esriFieldTypeString`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl FieldInfo {
    /// Create field with just a name
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            field_type: None,
        }
    }
}

/// Dataset id plus layer index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    /// 32-character hexadecimal item id
    pub item_id: String,
    /// Layer index within the dataset
    pub layer: u32,
}

impl DatasetRef {
    /// Create dataset reference
    #[inline]
    #[must_use]
    pub fn new(item_id: impl Into<String>, layer: u32) -> Self {
        Self {
            item_id: item_id.into(),
            layer,
        }
    }
}

impl std::fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.item_id, self.layer)
    }
}

/// Lookup of a dataset layer's field metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldCatalog: Send + Sync {
    /// Fetch the schema fields of one layer
    ///
    /// # Errors
    /// Any transport, status or decoding failure
    async fn fetch_field_metadata(
        &self,
        dataset_id: &str,
        layer: u32,
    ) -> Result<Vec<FieldInfo>, CollaboratorError>;
}

#[async_trait]
impl<T: FieldCatalog + ?Sized> FieldCatalog for Arc<T> {
    async fn fetch_field_metadata(
        &self,
        dataset_id: &str,
        layer: u32,
    ) -> Result<Vec<FieldInfo>, CollaboratorError> {
        (**self).fetch_field_metadata(dataset_id, layer).await
    }
}

/// Read and write access to documents by id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document stored under `id`
    ///
    /// # Errors
    /// Non-success responses and malformed bodies
    async fn fetch_document(&self, id: &str) -> Result<Document, CollaboratorError>;

    /// Replace the document stored under `id`
    ///
    /// # Errors
    /// Any non-success response; there is no partial success
    async fn push_document(&self, id: &str, document: &Document) -> Result<(), CollaboratorError>;
}

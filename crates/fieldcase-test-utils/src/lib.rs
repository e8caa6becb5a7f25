//! Testing utilities for fieldcase workspace
//!
//! Dashboard fixtures and in-memory collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use fieldcase_core::{
    CollaboratorError, DatasetRef, Document, DocumentStore, FieldCatalog, FieldInfo,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TARGET_ID: &str = "0123456789abcdef0123456789abcdef";
pub const OTHER_ID: &str = "fedcba9876543210fedcba9876543210";
pub const DASHBOARD_ID: &str = "d00dfeedd00dfeedd00dfeedd00dfeed";

pub fn target_dataset() -> DatasetRef {
    DatasetRef::new(TARGET_ID, 0)
}

/// Widget bound through an `itemDataSource` descriptor
pub fn item_widget(item_id: &str, body: Value) -> Value {
    let mut widget = json!({
        "type": "chartWidget",
        "dataSource": {"type": "itemDataSource", "itemId": item_id, "layerId": 0}
    });
    merge(&mut widget, body);
    widget
}

/// Widget bound through an arcade data source
pub fn arcade_widget(script_id: &str, body: Value) -> Value {
    let mut widget = json!({
        "type": "tableWidget",
        "dataSource": {"type": "arcadeDataSource", "itemId": script_id}
    });
    merge(&mut widget, body);
    widget
}

const PORTAL: &str = "https://www.arcgis.com";

/// Arcade script loading a feature set from each of `item_ids`
pub fn feature_set_script(item_ids: &[&str], fields: &[&str]) -> String {
    let field_list = fields.iter().map(|f| format!("'{f}'")).collect::<Vec<_>>().join(", ");
    item_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                "var fs{i} = FeatureSetByPortalItem(Portal('{PORTAL}'), '{id}', 0, [{field_list}]);"
            )
        })
        .chain(std::iter::once("return fs0;".to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn arcade_item(script_id: &str, script: &str) -> Value {
    json!({"id": script_id, "name": "Data expression", "script": script})
}

pub fn dashboard(widgets: Vec<Value>) -> Document {
    dashboard_with_arcade(widgets, Vec::new())
}

pub fn dashboard_with_arcade(widgets: Vec<Value>, arcade_items: Vec<Value>) -> Document {
    let mut root = json!({
        "version": 27,
        "headerPanel": {"type": "headerPanel", "title": "Population"},
        "desktopView": {"widgets": widgets}
    });
    if !arcade_items.is_empty() {
        merge(&mut root, json!({"arcadeDataSourceItems": arcade_items}));
    }
    Document::from_value(root).unwrap()
}

fn merge(target: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(extra)) = (target, extra) {
        target.extend(extra);
    }
}

/// Field catalog serving fixed layers
#[derive(Debug, Default)]
pub struct StaticCatalog {
    layers: HashMap<(String, u32), Vec<FieldInfo>>,
    calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, dataset_id: &str, layer: u32, names: &[&str]) -> Self {
        let fields = names.iter().map(|n| FieldInfo::named(*n)).collect();
        self.layers.insert((dataset_id.to_string(), layer), fields);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldCatalog for StaticCatalog {
    async fn fetch_field_metadata(
        &self,
        dataset_id: &str,
        layer: u32,
    ) -> Result<Vec<FieldInfo>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.layers
            .get(&(dataset_id.to_string(), layer))
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("{dataset_id}/{layer}")))
    }
}

/// Document store backed by a map, recording pushes
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
    pushes: Mutex<Vec<String>>,
    reject_pushes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: &str, document: Document) -> Self {
        self.documents.lock().insert(id.to_string(), document);
        self
    }

    pub fn rejecting_pushes(mut self) -> Self {
        self.reject_pushes = true;
        self
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.documents.lock().get(id).cloned()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_document(&self, id: &str) -> Result<Document, CollaboratorError> {
        self.document(id)
            .ok_or_else(|| CollaboratorError::NotFound(id.to_string()))
    }

    async fn push_document(&self, id: &str, document: &Document) -> Result<(), CollaboratorError> {
        if self.reject_pushes {
            return Err(CollaboratorError::Rejected(format!("update of {id} refused")));
        }
        self.documents.lock().insert(id.to_string(), document.clone());
        self.pushes.lock().push(id.to_string());
        Ok(())
    }
}

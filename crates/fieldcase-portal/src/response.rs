//! Portal response decoding
//!
//! The portal reports most failures as HTTP 200 with an `{"error": ...}`
//! body, so every JSON body passes through [`check`] first.

use crate::error::{PortalError, PortalResult};
use fieldcase_core::FieldInfo;
use serde::Deserialize;
use serde_json::Value;

/// Item summary returned by `content/items/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemInfo {
    /// Item id
    pub id: String,
    /// Owning account, needed for updates
    pub owner: String,
    /// Item type, e.g. `Dashboard` or `Feature Service`
    #[serde(rename = "type")]
    pub item_type: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Service URL for service items
    #[serde(default)]
    pub url: Option<String>,
}

/// Turn an `{"error": {...}}` body into [`PortalError::Api`]
///
/// # Errors
/// `PortalError::Api` when the body carries an error object
pub fn check(body: Value) -> PortalResult<Value> {
    let Some(error) = body.get("error") else {
        return Ok(body);
    };
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let mut message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    if let Some(details) = error.get("details").and_then(Value::as_array) {
        let details: Vec<&str> = details.iter().filter_map(Value::as_str).collect();
        if !details.is_empty() {
            message = format!("{message} ({})", details.join("; "));
        }
    }
    Err(PortalError::Api { code, message })
}

/// Token from a `generateToken` response
///
/// # Errors
/// Portal errors, or a body without a token
pub fn token(body: Value) -> PortalResult<String> {
    check(body)?
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PortalError::invalid("token response without token"))
}

/// Item summary
///
/// # Errors
/// Portal errors, or a body that is not an item
pub fn item_info(body: Value) -> PortalResult<ItemInfo> {
    serde_json::from_value(check(body)?)
        .map_err(|e| PortalError::invalid(format!("item info: {e}")))
}

/// Field list of a layer resource
///
/// # Errors
/// Portal errors, or a layer without a `fields` list
pub fn layer_fields(body: Value) -> PortalResult<Vec<FieldInfo>> {
    let mut body = check(body)?;
    let fields = body
        .get_mut("fields")
        .map(Value::take)
        .ok_or_else(|| PortalError::invalid("layer resource has no fields"))?;
    serde_json::from_value(fields).map_err(|e| PortalError::invalid(format!("layer fields: {e}")))
}

/// Outcome of an item update
///
/// # Errors
/// Portal errors, or `success` missing or false
pub fn update(body: Value) -> PortalResult<()> {
    let body = check(body)?;
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err(PortalError::invalid(format!("update not acknowledged: {body}")))
    }
}

/// Layer resource URL under a service URL
#[must_use]
pub fn layer_url(service_url: &str, layer: u32) -> String {
    format!("{}/{layer}", service_url.trim_end_matches('/'))
}

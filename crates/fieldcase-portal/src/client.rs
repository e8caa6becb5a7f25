//! Portal REST client
//!
//! Implements [`FieldCatalog`] and [`DocumentStore`] over the sharing REST
//! API. A token is generated on first use when credentials are configured;
//! without them every request is anonymous.

use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::response::{self, ItemInfo};
use async_trait::async_trait;
use fieldcase_core::{CollaboratorError, Document, DocumentStore, FieldCatalog, FieldInfo};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Sharing REST client
#[derive(Debug)]
pub struct PortalClient {
    http: Client,
    config: PortalConfig,
    token: OnceCell<Option<String>>,
}

impl PortalClient {
    /// Create client
    ///
    /// # Errors
    /// `PortalError::Config` for a username without password,
    /// `PortalError::Transport` if the HTTP client cannot be built
    pub fn new(config: PortalConfig) -> PortalResult<Self> {
        if config.username.is_some() && config.password.is_none() {
            return Err(PortalError::Config("username given without password".into()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            token: OnceCell::new(),
        })
    }

    /// Access token, generated once
    ///
    /// # Errors
    /// Token generation failures
    pub async fn token(&self) -> PortalResult<Option<&str>> {
        let token = self.token.get_or_try_init(|| self.generate_token()).await?;
        Ok(token.as_deref())
    }

    async fn generate_token(&self) -> PortalResult<Option<String>> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password) else {
            tracing::debug!("no credentials configured; using anonymous access");
            return Ok(None);
        };
        let url = format!("{}/generateToken", self.config.base_url());
        let form = [
            ("username", username.as_str()),
            ("password", password.as_str()),
            ("referer", self.config.referer.as_str()),
            ("f", "json"),
        ];
        let body = send(self.http.post(&url).form(&form)).await?;
        let token = response::token(body)?;
        tracing::info!("generated portal token for {}", username);
        Ok(Some(token))
    }

    async fn get(&self, url: &str) -> PortalResult<Value> {
        let mut request = self.http.get(url).query(&[("f", "json")]);
        if let Some(token) = self.token().await? {
            request = request.query(&[("token", token)]);
        }
        send(request).await
    }

    /// Item summary
    ///
    /// # Errors
    /// Request or decoding failures
    pub async fn item_info(&self, item_id: &str) -> PortalResult<ItemInfo> {
        let url = format!("{}/content/items/{item_id}", self.config.base_url());
        response::item_info(self.get(&url).await?)
    }

    /// Item data (the dashboard configuration)
    ///
    /// # Errors
    /// Request failures, or data that is not a JSON mapping
    pub async fn item_data(&self, item_id: &str) -> PortalResult<Document> {
        let url = format!("{}/content/items/{item_id}/data", self.config.base_url());
        let body = response::check(self.get(&url).await?)?;
        Document::from_value(body)
            .map_err(|e| PortalError::invalid(format!("item {item_id} data: {e}")))
    }

    /// Field list of one layer of a service
    ///
    /// # Errors
    /// Request or decoding failures
    pub async fn service_layer_fields(
        &self,
        service_url: &str,
        layer: u32,
    ) -> PortalResult<Vec<FieldInfo>> {
        response::layer_fields(self.get(&response::layer_url(service_url, layer)).await?)
    }

    /// Replace an item's data
    ///
    /// # Errors
    /// Request failures or an unacknowledged update
    pub async fn update_item_data(
        &self,
        owner: &str,
        item_id: &str,
        document: &Document,
    ) -> PortalResult<()> {
        let url = format!(
            "{}/content/users/{owner}/items/{item_id}/update",
            self.config.base_url()
        );
        let text = document
            .to_json()
            .map_err(|e| PortalError::invalid(e.to_string()))?;
        let mut form = vec![("f", "json"), ("id", item_id), ("text", text.as_str())];
        let token = self.token().await?;
        if let Some(token) = token {
            form.push(("token", token));
        }
        response::update(send(self.http.post(&url).form(&form)).await?)
    }
}

async fn send(request: RequestBuilder) -> PortalResult<Value> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PortalError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| PortalError::invalid(format!("malformed JSON body: {e}")))
}

#[async_trait]
impl FieldCatalog for PortalClient {
    async fn fetch_field_metadata(
        &self,
        dataset_id: &str,
        layer: u32,
    ) -> Result<Vec<FieldInfo>, CollaboratorError> {
        let info = self.item_info(dataset_id).await?;
        let service_url = info.url.ok_or_else(|| {
            let kind = &info.item_type;
            PortalError::invalid(format!("item {dataset_id} ({kind}) has no service URL"))
        })?;
        let fields = self.service_layer_fields(&service_url, layer).await?;
        tracing::debug!("layer {} of {} lists {} fields", layer, dataset_id, fields.len());
        Ok(fields)
    }
}

#[async_trait]
impl DocumentStore for PortalClient {
    async fn fetch_document(&self, id: &str) -> Result<Document, CollaboratorError> {
        Ok(self.item_data(id).await?)
    }

    async fn push_document(&self, id: &str, document: &Document) -> Result<(), CollaboratorError> {
        let info = self.item_info(id).await?;
        self.update_item_data(&info.owner, id, document).await?;
        Ok(())
    }
}

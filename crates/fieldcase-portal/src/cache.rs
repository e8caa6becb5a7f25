//! Memoized field metadata using moka
//!
//! Batch runs migrate many documents against the same dataset; the layer
//! schema is fetched once per `(dataset, layer)` and shared.

use async_trait::async_trait;
use fieldcase_core::{CollaboratorError, FieldCatalog, FieldInfo};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

type LayerKey = (String, u32);

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of cached layers
    pub entry_count: u64,
}

/// Field catalog wrapper caching successful lookups
#[derive(Debug)]
pub struct CachedCatalog<C> {
    inner: C,
    layers: Cache<LayerKey, Arc<Vec<FieldInfo>>>,
}

impl<C: FieldCatalog> CachedCatalog<C> {
    /// Create cache holding up to `max_layers` schemas
    #[inline]
    #[must_use]
    pub fn new(inner: C, max_layers: u64) -> Self {
        Self {
            inner,
            layers: Cache::new(max_layers),
        }
    }

    /// Create cache whose entries expire after `ttl`
    #[inline]
    #[must_use]
    pub fn with_ttl(inner: C, max_layers: u64, ttl: Duration) -> Self {
        Self {
            inner,
            layers: Cache::builder().max_capacity(max_layers).time_to_live(ttl).build(),
        }
    }

    /// Get wrapped catalog
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Get cache statistics once pending maintenance has run
    pub async fn stats(&self) -> CacheStats {
        self.layers.run_pending_tasks().await;
        CacheStats {
            entry_count: self.layers.entry_count(),
        }
    }
}

#[async_trait]
impl<C: FieldCatalog> FieldCatalog for CachedCatalog<C> {
    async fn fetch_field_metadata(
        &self,
        dataset_id: &str,
        layer: u32,
    ) -> Result<Vec<FieldInfo>, CollaboratorError> {
        let key = (dataset_id.to_ascii_lowercase(), layer);
        let fields = self
            .layers
            .try_get_with(key, async {
                tracing::debug!("field metadata cache miss for {}/{}", dataset_id, layer);
                self.inner.fetch_field_metadata(dataset_id, layer).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<CollaboratorError>| (*e).clone())?;
        Ok(fields.as_ref().clone())
    }
}

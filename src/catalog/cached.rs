use crate::catalog::{CatalogFilter, CatalogResult, CatalogStore};
use crate::models::{CameraRecord, CameraSummary};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Read-through cache in front of a catalog store.
///
/// The catalog changes slowly, so list results (keyed by filter) and single
/// lookups (including misses) are kept for a short TTL. Store errors are
/// never cached.
pub struct CachedCatalog {
    inner: Arc<dyn CatalogStore>,
    list_cache: Cache<String, Arc<Vec<CameraSummary>>>,
    get_cache: Cache<String, Option<CameraRecord>>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn CatalogStore>, max_entries: u64, ttl: Duration) -> Self {
        let list_cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        let get_cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self {
            inner,
            list_cache,
            get_cache,
        }
    }

    /// Drop every cached entry
    pub fn invalidate_all(&self) {
        self.list_cache.invalidate_all();
        self.get_cache.invalidate_all();
    }
}

#[async_trait]
impl CatalogStore for CachedCatalog {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn list(&self, filter: &CatalogFilter) -> CatalogResult<Vec<CameraSummary>> {
        let key = filter.cache_key();
        if let Some(cached) = self.list_cache.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let cameras = self.inner.list(filter).await?;
        self.list_cache
            .insert(key, Arc::new(cameras.clone()))
            .await;

        Ok(cameras)
    }

    async fn get(&self, id: &str) -> CatalogResult<Option<CameraRecord>> {
        if let Some(cached) = self.get_cache.get(id).await {
            return Ok(cached);
        }

        let camera = self.inner.get(id).await?;
        self.get_cache.insert(id.to_string(), camera.clone()).await;

        Ok(camera)
    }
}

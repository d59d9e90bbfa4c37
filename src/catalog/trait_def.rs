use crate::catalog::CatalogFilter;
use crate::models::{CameraRecord, CameraSummary};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Read-only access to the point-geometry camera catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Initialize the catalog schema
    async fn init(&self) -> Result<()>;

    /// List cameras whose point lies inside the filter's viewport (closed
    /// envelope) and whose role equals the filter's role. Absent parts of the
    /// filter do not constrain the result.
    async fn list(&self, filter: &CatalogFilter) -> CatalogResult<Vec<CameraSummary>>;

    /// Get a single camera, stream locator included
    async fn get(&self, id: &str) -> CatalogResult<Option<CameraRecord>>;
}

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::catalog::{CatalogFilter, CatalogStore};
use crate::models::{CameraRecord, CameraSummary, ListCamerasQuery};
use crate::telemetry::{
    CatalogQueryKind, CatalogQueryOutcome, ClientContextResolver, HeartbeatPolicy,
    TelemetryRegistry,
};

pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub telemetry: Arc<TelemetryRegistry>,
    pub resolver: ClientContextResolver,
    pub heartbeat: HeartbeatPolicy,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// List cameras inside an optional viewport and of an optional role
pub async fn list_cameras(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListCamerasQuery>, QueryRejection>,
) -> Result<Json<Vec<CameraSummary>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let filter = CatalogFilter::from_params(query.bbox.as_deref(), query.role.as_deref())?;

    match state.catalog.list(&filter).await {
        Ok(cameras) => {
            state
                .telemetry
                .record_catalog_query(CatalogQueryKind::List, CatalogQueryOutcome::Ok);
            Ok(Json(cameras))
        }
        Err(e) => {
            state
                .telemetry
                .record_catalog_query(CatalogQueryKind::List, CatalogQueryOutcome::Error);
            Err(e.into())
        }
    }
}

/// Get a single camera, stream locator included
pub async fn get_camera(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CameraRecord>, ApiError> {
    match state.catalog.get(&id).await {
        Ok(Some(camera)) => {
            state
                .telemetry
                .record_catalog_query(CatalogQueryKind::Get, CatalogQueryOutcome::Ok);
            Ok(Json(camera))
        }
        Ok(None) => {
            state
                .telemetry
                .record_catalog_query(CatalogQueryKind::Get, CatalogQueryOutcome::NotFound);
            Err(ApiError::NotFound(format!("camera '{id}' not found")))
        }
        Err(e) => {
            state
                .telemetry
                .record_catalog_query(CatalogQueryKind::Get, CatalogQueryOutcome::Error);
            Err(e.into())
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

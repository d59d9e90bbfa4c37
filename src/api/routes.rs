use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{get_camera, health_check, list_cameras, AppState};
use super::telemetry::{heartbeat, metrics, view_end, view_start};

pub fn create_api_router(state: Arc<AppState>, allow_any_origin: bool) -> Router {
    let api_routes = Router::new()
        .route("/cameras", get(list_cameras))
        .route("/cameras/{id}", get(get_camera))
        .route("/telemetry/view-start", post(view_start))
        .route("/telemetry/heartbeat", post(heartbeat))
        .route("/telemetry/view-end", post(view_end))
        .with_state(Arc::clone(&state));

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http());

    if allow_any_origin {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

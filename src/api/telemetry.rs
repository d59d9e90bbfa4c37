//! Viewer telemetry handlers
//!
//! Events carry no response body. Resolution problems (no GeoIP, odd
//! user-agents) never fail a request; only a malformed body, a missing
//! camera id or an unacceptable heartbeat duration do.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::error::ApiError;
use super::extract::ClientPeer;
use super::handlers::AppState;
use crate::models::{HeartbeatRequest, ViewEventRequest};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Record the start of a viewing session
pub async fn view_start(
    State(state): State<Arc<AppState>>,
    ClientPeer(peer): ClientPeer,
    headers: HeaderMap,
    payload: Result<Json<ViewEventRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = body(payload)?;
    let camera_id = request.camera_id.unwrap_or_default();
    let ctx = state.resolver.resolve_request(&headers, peer);

    state.telemetry.record_view_start(&camera_id, &ctx)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Credit watched seconds to a camera
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    ClientPeer(peer): ClientPeer,
    headers: HeaderMap,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = body(payload)?;
    let camera_id = request.camera_id.unwrap_or_default();
    let seconds = state.heartbeat.resolve(request.seconds)?;
    let ctx = state.resolver.resolve_request(&headers, peer);

    state.telemetry.record_heartbeat(&camera_id, &ctx, seconds)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record the end of a viewing session
pub async fn view_end(
    State(state): State<Arc<AppState>>,
    ClientPeer(peer): ClientPeer,
    headers: HeaderMap,
    payload: Result<Json<ViewEventRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = body(payload)?;
    let camera_id = request.camera_id.unwrap_or_default();
    let ctx = state.resolver.resolve_request(&headers, peer);

    state.telemetry.record_view_end(&camera_id, &ctx)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.telemetry.snapshot()?;
    Ok((
        [(header::CONTENT_TYPE, state.telemetry.content_type())],
        snapshot,
    ))
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full catalog entry for a single camera, including its stream locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CameraRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub stream_url: String,
    pub is_active: bool,
    pub profile: String,
    pub width: i32,
    pub height: i32,
    pub fps: i32,
    pub audio_enabled: bool,
    pub last_status: Option<String>,
    /// Unix timestamp of the last health check, if one ever ran
    pub last_checked_at: Option<i64>,
    pub lng: f64,
    pub lat: f64,
}

/// Camera as returned by list queries. The stream locator is deliberately
/// absent from this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CameraSummary {
    pub id: String,
    pub name: String,
    pub role: String,
    pub width: i32,
    pub height: i32,
    pub fps: i32,
    pub profile: String,
    pub audio_enabled: bool,
    pub last_status: Option<String>,
    pub last_checked_at: Option<i64>,
    pub lng: f64,
    pub lat: f64,
}

impl From<CameraRecord> for CameraSummary {
    fn from(record: CameraRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            role: record.role,
            width: record.width,
            height: record.height,
            fps: record.fps,
            profile: record.profile,
            audio_enabled: record.audio_enabled,
            last_status: record.last_status,
            last_checked_at: record.last_checked_at,
            lng: record.lng,
            lat: record.lat,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCamerasQuery {
    /// `minLng,minLat,maxLng,maxLat`
    pub bbox: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewEventRequest {
    pub camera_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HeartbeatRequest {
    pub camera_id: Option<String>,
    pub seconds: Option<f64>,
}

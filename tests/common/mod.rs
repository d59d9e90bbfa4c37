//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use vantage::catalog::{CatalogStore, SqliteCatalog};

/// Camera row used to seed test catalogs
pub struct Seed {
    pub id: &'static str,
    pub role: &'static str,
    pub lng: f64,
    pub lat: f64,
}

pub const fn seed(id: &'static str, role: &'static str, lng: f64, lat: f64) -> Seed {
    Seed { id, role, lng, lat }
}

/// The two-camera catalog used by the end-to-end scenarios
pub const SCENARIO: [Seed; 2] = [
    seed("cam1", "traffic", 10.0, 20.0),
    seed("cam2", "perimeter", 50.0, 60.0),
];

/// Create an in-memory SQLite catalog containing `cameras`.
///
/// A single connection is used so that every query sees the same
/// in-memory database.
pub async fn sqlite_catalog(cameras: &[Seed]) -> Arc<SqliteCatalog> {
    let catalog = SqliteCatalog::new("sqlite::memory:", 1).await.unwrap();
    catalog.init().await.unwrap();

    for camera in cameras {
        sqlx::query(
            r#"
            INSERT INTO cameras (id, name, role, stream_url, is_active, profile, width, height,
                                 fps, audio_enabled, last_status, last_checked_at, lng, lat)
            VALUES (?, ?, ?, ?, 1, 'h264-main', 1920, 1080, 30, 0, NULL, NULL, ?, ?)
            "#,
        )
        .bind(camera.id)
        .bind(format!("Camera {}", camera.id))
        .bind(camera.role)
        .bind(format!("rtsp://streams.internal/{}", camera.id))
        .bind(camera.lng)
        .bind(camera.lat)
        .execute(catalog.pool())
        .await
        .unwrap();
    }

    Arc::new(catalog)
}

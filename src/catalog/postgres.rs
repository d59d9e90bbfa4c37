use crate::catalog::{CatalogFilter, CatalogResult, CatalogStore};
use crate::models::{CameraRecord, CameraSummary};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

const SUMMARY_COLUMNS: &str = "id, name, role, width, height, fps, profile, audio_enabled, \
                               last_status, last_checked_at, \
                               ST_X(location) AS lng, ST_Y(location) AS lat";

/// PostGIS-backed catalog. Each camera carries a `geometry(Point, 4326)`
/// and viewport queries use a planar `ST_Covers` against an envelope, so
/// points on the boundary are included.
pub struct PostgresCatalog {
    pool: Arc<PgPool>,
}

impl PostgresCatalog {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

pub(crate) fn build_list_query(filter: &CatalogFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} FROM cameras"));
    let mut has_predicate = false;

    if let Some(viewport) = filter.viewport {
        builder
            .push(" WHERE ST_Covers(ST_MakeEnvelope(")
            .push_bind(viewport.min_lng)
            .push(", ")
            .push_bind(viewport.min_lat)
            .push(", ")
            .push_bind(viewport.max_lng)
            .push(", ")
            .push_bind(viewport.max_lat)
            .push(", 4326), location)");
        has_predicate = true;
    }

    if let Some(role) = filter.role.as_deref() {
        builder
            .push(if has_predicate { " AND " } else { " WHERE " })
            .push("role = ")
            .push_bind(role);
    }

    builder.push(" ORDER BY id");
    builder
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    async fn init(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cameras (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                stream_url TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                profile TEXT NOT NULL,
                width INTEGER NOT NULL CHECK (width > 0),
                height INTEGER NOT NULL CHECK (height > 0),
                fps INTEGER NOT NULL CHECK (fps > 0),
                audio_enabled BOOLEAN NOT NULL DEFAULT FALSE,
                last_status TEXT,
                last_checked_at BIGINT,
                location geometry(Point, 4326) NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cameras_location ON cameras USING GIST (location)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cameras_role ON cameras(role)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn list(&self, filter: &CatalogFilter) -> CatalogResult<Vec<CameraSummary>> {
        // ST_MakeEnvelope normalises swapped corners, so inverted boxes must
        // be caught here to keep the result identical to the SQLite backend
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }

        let cameras = build_list_query(filter)
            .build_query_as::<CameraSummary>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(cameras)
    }

    async fn get(&self, id: &str) -> CatalogResult<Option<CameraRecord>> {
        let camera = sqlx::query_as::<_, CameraRecord>(
            r#"
            SELECT id, name, role, stream_url, is_active, profile, width, height, fps,
                   audio_enabled, last_status, last_checked_at,
                   ST_X(location) AS lng, ST_Y(location) AS lat
            FROM cameras
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(camera)
    }
}

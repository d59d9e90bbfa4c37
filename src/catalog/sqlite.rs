use crate::catalog::{CatalogFilter, CatalogResult, CatalogStore};
use crate::models::{CameraRecord, CameraSummary};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;

const SUMMARY_COLUMNS: &str = "id, name, role, width, height, fps, profile, audio_enabled, \
                               last_status, last_checked_at, lng, lat";

/// SQLite-backed catalog. Points are stored as plain `lng`/`lat` columns and
/// containment is evaluated with inclusive range predicates.
pub struct SqliteCatalog {
    pool: Arc<SqlitePool>,
}

impl SqliteCatalog {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Underlying pool, for tooling that loads catalog rows out of band
    pub fn pool(&self) -> &SqlitePool {
        self.pool.as_ref()
    }
}

/// Build the list query for a filter.
///
/// Viewport and role are combined with `AND`; each absent part simply adds
/// no predicate.
pub(crate) fn build_list_query(filter: &CatalogFilter) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} FROM cameras"));
    let mut has_predicate = false;

    if let Some(viewport) = filter.viewport {
        builder
            .push(" WHERE lng BETWEEN ")
            .push_bind(viewport.min_lng)
            .push(" AND ")
            .push_bind(viewport.max_lng)
            .push(" AND lat BETWEEN ")
            .push_bind(viewport.min_lat)
            .push(" AND ")
            .push_bind(viewport.max_lat);
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
impl CatalogStore for SqliteCatalog {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cameras (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                stream_url TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                profile TEXT NOT NULL,
                width INTEGER NOT NULL CHECK (width > 0),
                height INTEGER NOT NULL CHECK (height > 0),
                fps INTEGER NOT NULL CHECK (fps > 0),
                audio_enabled INTEGER NOT NULL DEFAULT 0,
                last_status TEXT,
                last_checked_at INTEGER,
                lng REAL NOT NULL CHECK (lng BETWEEN -180 AND 180),
                lat REAL NOT NULL CHECK (lat BETWEEN -90 AND 90)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cameras_lng_lat ON cameras(lng, lat)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cameras_role ON cameras(role)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn list(&self, filter: &CatalogFilter) -> CatalogResult<Vec<CameraSummary>> {
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
                   audio_enabled, last_status, last_checked_at, lng, lat
            FROM cameras
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(camera)
    }
}

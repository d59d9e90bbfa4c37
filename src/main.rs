use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vantage::api::{self, AppState};
use vantage::catalog::{CachedCatalog, CatalogStore, PostgresCatalog, SqliteCatalog};
use vantage::config::{Config, DatabaseBackend};
use vantage::telemetry::{load_country_lookup, ClientContextResolver, TelemetryRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vantage=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize catalog
    let store: Arc<dyn CatalogStore> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite catalog: {}", config.database.url);
            Arc::new(SqliteCatalog::new(&config.database.url, config.database.max_connections).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostGIS catalog: {}", config.database.url);
            Arc::new(
                PostgresCatalog::new(&config.database.url, config.database.max_connections).await?,
            )
        }
    };

    info!("Initializing catalog schema...");
    store.init().await?;
    info!("Catalog initialized successfully");

    let catalog: Arc<dyn CatalogStore> = if config.cache.enabled() {
        info!(
            "Catalog read cache enabled (ttl: {}s, max entries: {})",
            config.cache.ttl_secs, config.cache.max_entries
        );
        Arc::new(CachedCatalog::new(
            store,
            config.cache.max_entries,
            Duration::from_secs(config.cache.ttl_secs),
        ))
    } else {
        info!("Catalog read cache disabled");
        store
    };

    // Telemetry: GeoIP is resolved once; failures degrade to unknown countries
    let countries = load_country_lookup(config.telemetry.geoip_db_path.as_deref());
    let resolver = ClientContextResolver::with_country_lookup(countries);
    let telemetry = Arc::new(TelemetryRegistry::new()?);
    let heartbeat = config.telemetry.heartbeat_policy();
    match heartbeat.max_secs {
        Some(max) => info!(
            "Heartbeats default to {}s, capped at {}s",
            heartbeat.default_secs, max
        ),
        None => info!("Heartbeats default to {}s, uncapped", heartbeat.default_secs),
    }

    let state = Arc::new(AppState {
        catalog,
        telemetry,
        resolver,
        heartbeat,
    });
    let router = api::create_api_router(state, config.cors.allow_any_origin);

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Catalog endpoints at http://{}/api/cameras", api_addr);
    info!("   - Prometheus metrics at http://{}/metrics", api_addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

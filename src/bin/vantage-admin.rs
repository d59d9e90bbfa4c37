use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vantage::catalog::{CatalogFilter, CatalogStore, PostgresCatalog, SqliteCatalog};
use vantage::config::{Config, DatabaseBackend};

#[derive(Parser)]
#[command(name = "vantage-admin")]
#[command(about = "Vantage catalog inspection CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog schema if it does not exist
    Init,
    /// List cameras, optionally inside a viewport and/or of a role
    List {
        /// Viewport as minLng,minLat,maxLng,maxLat
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,
        /// Exact (case-sensitive) role
        #[arg(long)]
        role: Option<String>,
    },
    /// Show a single camera, stream locator included
    Get {
        /// Camera ID
        id: String,
    },
}

fn format_checked_at(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vantage=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let catalog: Arc<dyn CatalogStore> = match config.database.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteCatalog::new(&config.database.url, config.database.max_connections).await?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresCatalog::new(&config.database.url, config.database.max_connections).await?,
        ),
    };

    match cli.command {
        Commands::Init => {
            catalog.init().await?;
            println!("✓ Catalog schema initialized");
        }
        Commands::List { bbox, role } => {
            let filter = CatalogFilter::from_params(bbox.as_deref(), role.as_deref())
                .context("invalid --bbox")?;
            let cameras = catalog.list(&filter).await?;
            if cameras.is_empty() {
                println!("No cameras matched.");
            } else {
                println!(
                    "{:<20} {:<28} {:<12} {:>11} {:>10} {:<10} {}",
                    "ID", "Name", "Role", "Lng", "Lat", "Status", "Checked"
                );
                println!("{}", "-".repeat(110));
                for camera in cameras {
                    println!(
                        "{:<20} {:<28} {:<12} {:>11.5} {:>10.5} {:<10} {}",
                        camera.id,
                        camera.name,
                        camera.role,
                        camera.lng,
                        camera.lat,
                        camera.last_status.as_deref().unwrap_or("-"),
                        format_checked_at(camera.last_checked_at)
                    );
                }
            }
        }
        Commands::Get { id } => match catalog.get(&id).await? {
            Some(camera) => println!("{}", serde_json::to_string_pretty(&camera)?),
            None => println!("⚠ Camera '{}' not found", id),
        },
    }

    Ok(())
}

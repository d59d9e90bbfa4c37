use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::telemetry::heartbeat::{DEFAULT_HEARTBEAT_SECS, DEFAULT_MAX_HEARTBEAT_SECS};
use crate::telemetry::HeartbeatPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub cache: CacheConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Path to a MaxMind Country or City .mmdb file
    /// If None, every viewer is attributed to the unknown country
    pub geoip_db_path: Option<String>,
    pub heartbeat_default_secs: f64,
    /// 0 disables the upper bound
    pub heartbeat_max_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 0 disables the catalog read cache
    pub ttl_secs: u64,
    pub max_entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allow_any_origin: bool,
}

impl TelemetryConfig {
    pub fn heartbeat_policy(&self) -> HeartbeatPolicy {
        let max_secs = (self.heartbeat_max_secs > 0.0).then_some(self.heartbeat_max_secs);
        HeartbeatPolicy::new(self.heartbeat_default_secs, max_secs)
    }
}

impl CacheConfig {
    pub fn enabled(&self) -> bool {
        self.ttl_secs > 0 && self.max_entries > 0
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                backend: DatabaseBackend::Sqlite,
                url: "sqlite://./vantage.db".to_string(),
                max_connections: 10,
            },
            api_server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            telemetry: TelemetryConfig {
                geoip_db_path: None,
                heartbeat_default_secs: DEFAULT_HEARTBEAT_SECS,
                heartbeat_max_secs: DEFAULT_MAX_HEARTBEAT_SECS,
            },
            cache: CacheConfig {
                ttl_secs: 30,
                max_entries: 10_000,
            },
            cors: CorsConfig {
                allow_any_origin: true,
            },
        }
    }
}

/// Parse an optional environment variable, keeping `default` when unset
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults.database.url.clone());
        let max_connections =
            env_parse("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections)?;

        let api_host =
            std::env::var("API_HOST").unwrap_or_else(|_| defaults.api_server.host.clone());
        let api_port = env_parse("API_PORT", defaults.api_server.port)?;

        let geoip_db_path = std::env::var("GEOIP_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());
        let heartbeat_default_secs = env_parse(
            "HEARTBEAT_DEFAULT_SECS",
            defaults.telemetry.heartbeat_default_secs,
        )?;
        if !heartbeat_default_secs.is_finite() || heartbeat_default_secs <= 0.0 {
            anyhow::bail!("HEARTBEAT_DEFAULT_SECS must be a positive number");
        }
        let heartbeat_max_secs =
            env_parse("HEARTBEAT_MAX_SECS", defaults.telemetry.heartbeat_max_secs)?;

        let cache_ttl_secs = env_parse("CATALOG_CACHE_TTL_SECS", defaults.cache.ttl_secs)?;
        let cache_max_entries =
            env_parse("CATALOG_CACHE_MAX_ENTRIES", defaults.cache.max_entries)?;

        let allow_any_origin = env_flag("CORS_ALLOW_ANY_ORIGIN", defaults.cors.allow_any_origin);

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            telemetry: TelemetryConfig {
                geoip_db_path,
                heartbeat_default_secs,
                heartbeat_max_secs,
            },
            cache: CacheConfig {
                ttl_secs: cache_ttl_secs,
                max_entries: cache_max_entries,
            },
            cors: CorsConfig { allow_any_origin },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_heartbeat_policy() {
        let policy = Config::default().telemetry.heartbeat_policy();
        assert_eq!(policy.default_secs, 10.0);
        assert_eq!(policy.max_secs, Some(3600.0));
    }

    #[test]
    fn test_zero_max_disables_heartbeat_bound() {
        let telemetry = TelemetryConfig {
            geoip_db_path: None,
            heartbeat_default_secs: 10.0,
            heartbeat_max_secs: 0.0,
        };
        assert_eq!(telemetry.heartbeat_policy().max_secs, None);
    }

    #[test]
    fn test_cache_enabled() {
        assert!(Config::default().cache.enabled());
        let disabled = CacheConfig {
            ttl_secs: 0,
            max_entries: 10,
        };
        assert!(!disabled.enabled());
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("VANTAGE_TEST_PORT_GARBAGE", "eighty");
        let result = env_parse::<u16>("VANTAGE_TEST_PORT_GARBAGE", 8080);
        assert!(result.is_err());
        std::env::remove_var("VANTAGE_TEST_PORT_GARBAGE");

        assert_eq!(env_parse::<u16>("VANTAGE_TEST_PORT_UNSET", 8080).unwrap(), 8080);
    }
}

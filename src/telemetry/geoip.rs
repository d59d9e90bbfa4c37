//! Country lookup using a MaxMind GeoLite2/GeoIP2 MMDB
//!
//! The database is opened once at startup. If it is not configured or fails
//! to open, the service runs with [`NoGeoIp`] for the rest of its lifetime
//! and every address resolves to the unknown country.

use anyhow::{Context, Result};
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Address to country-code resolution.
pub trait CountryLookup: Send + Sync {
    /// ISO 3166-1 alpha-2 code for `address`, or `None` if it cannot be
    /// resolved.
    fn country_code(&self, address: &str) -> Option<String>;
}

/// Lookup used when no database is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeoIp;

impl CountryLookup for NoGeoIp {
    fn country_code(&self, _address: &str) -> Option<String> {
        None
    }
}

/// GeoIP lookup backed by a memory-mapped Country or City database
pub struct GeoIpService {
    reader: Arc<Reader<Mmap>>,
}

impl GeoIpService {
    /// Open the MMDB file at `path`
    pub fn new(path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP database at {}", path))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup(&self, ip: IpAddr) -> Option<String> {
        let result = self.reader.lookup(ip).ok()?;

        // City databases are a superset of Country, so decoding as Country
        // works for both
        let country = result.decode::<geoip2::Country>().ok()??;
        country.country.iso_code.map(|code| code.to_string())
    }
}

impl Clone for GeoIpService {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
        }
    }
}

impl CountryLookup for GeoIpService {
    fn country_code(&self, address: &str) -> Option<String> {
        let ip = address.parse::<IpAddr>().ok()?;
        self.lookup(ip)
    }
}

/// Resolve the configured database into a lookup capability.
///
/// Never fails: a missing path or an unreadable database yields [`NoGeoIp`].
pub fn load_country_lookup(path: Option<&str>) -> Arc<dyn CountryLookup> {
    let Some(path) = path else {
        info!("No GeoIP database configured, countries will be reported as unknown");
        return Arc::new(NoGeoIp);
    };

    match GeoIpService::new(path) {
        Ok(service) => {
            info!("GeoIP database loaded from {}", path);
            Arc::new(service)
        }
        Err(e) => {
            warn!(error = %e, "GeoIP database unavailable, countries will be reported as unknown");
            Arc::new(NoGeoIp)
        }
    }
}

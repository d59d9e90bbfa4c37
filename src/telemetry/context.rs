//! Per-request client context used to label telemetry
//!
//! Resolution never fails: whatever cannot be determined collapses to the
//! unknown country or to `Other`.

use axum::http::{header::USER_AGENT, HeaderMap};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::telemetry::geoip::{CountryLookup, NoGeoIp};
use crate::telemetry::ip_extractor::extract_client_ip_from_headers;
use crate::telemetry::user_agent::{classify, Browser, Os, TokenParser, UserAgentParser};

/// Country label used whenever geolocation is unavailable or inconclusive
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Coarse, bounded-cardinality identity of a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClientContext {
    pub country: String,
    pub browser: Browser,
    pub os: Os,
}

impl ClientContext {
    pub fn new(country: impl Into<String>, browser: Browser, os: Os) -> Self {
        Self {
            country: country.into(),
            browser,
            os,
        }
    }

    /// Context with every dimension at its sentinel value
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_COUNTRY, Browser::Other, Os::Other)
    }
}

/// Only two-letter alphabetic codes are accepted as country labels
fn normalize_country(code: Option<String>) -> String {
    match code {
        Some(code) if code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()) => {
            code.to_ascii_uppercase()
        }
        _ => UNKNOWN_COUNTRY.to_string(),
    }
}

/// Derives a [`ClientContext`] from raw request metadata.
#[derive(Clone)]
pub struct ClientContextResolver {
    countries: Arc<dyn CountryLookup>,
    user_agents: Arc<dyn UserAgentParser>,
}

impl ClientContextResolver {
    pub fn new(countries: Arc<dyn CountryLookup>, user_agents: Arc<dyn UserAgentParser>) -> Self {
        Self {
            countries,
            user_agents,
        }
    }

    /// Resolver with the built-in user-agent parser and the given country lookup
    pub fn with_country_lookup(countries: Arc<dyn CountryLookup>) -> Self {
        Self::new(countries, Arc::new(TokenParser))
    }

    pub fn country_for(&self, address: &str) -> String {
        if address.is_empty() {
            return UNKNOWN_COUNTRY.to_string();
        }
        normalize_country(self.countries.country_code(address))
    }

    /// Resolve from an already extracted client address and user-agent
    pub fn resolve(&self, client_ip: &str, user_agent: &str) -> ClientContext {
        let (browser, os) = classify(self.user_agents.as_ref(), user_agent);
        ClientContext {
            country: self.country_for(client_ip),
            browser,
            os,
        }
    }

    /// Resolve from request headers and the transport peer, if known
    pub fn resolve_request(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientContext {
        let client_ip = extract_client_ip_from_headers(headers, peer);
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        self.resolve(&client_ip, user_agent)
    }
}

impl Default for ClientContextResolver {
    fn default() -> Self {
        Self::with_country_lookup(Arc::new(NoGeoIp))
    }
}

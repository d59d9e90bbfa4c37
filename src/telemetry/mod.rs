//! Anonymized viewer telemetry
//!
//! Requests are reduced to a [`ClientContext`] (country, browser family, OS
//! family) and counted against the camera they refer to. Raw addresses and
//! user-agent strings never reach the metric labels.

pub mod context;
pub mod geoip;
pub mod heartbeat;
pub mod ip_extractor;
pub mod registry;
pub mod user_agent;

pub use context::{ClientContext, ClientContextResolver, UNKNOWN_COUNTRY};
pub use geoip::{load_country_lookup, CountryLookup, GeoIpService, NoGeoIp};
pub use heartbeat::HeartbeatPolicy;
pub use ip_extractor::extract_client_ip;
pub use registry::{
    CatalogQueryKind, CatalogQueryOutcome, TelemetryError, TelemetryRegistry, TelemetryResult,
};
pub use user_agent::{Browser, Os, TokenParser, UserAgentParser};

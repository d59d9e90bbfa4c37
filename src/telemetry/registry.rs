//! Viewer telemetry instruments
//!
//! A [`TelemetryRegistry`] owns a Prometheus registry and the instruments
//! registered on it. It is created once at startup and handed to the HTTP
//! layer; tests create a fresh one per case.
//!
//! Every label value is either a camera id or comes from a closed vocabulary
//! (country code or `unknown`, [`Browser`], [`Os`]), so the number of series
//! grows with the camera count only.
//!
//! Each series is an atomic cell, so concurrent updates are never lost. The
//! start operation touches two instruments without a common lock; a scrape
//! may observe one update without the other.

use prometheus::proto::MetricType;
use prometheus::{CounterVec, Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;
use tracing::debug;

use crate::telemetry::context::ClientContext;

#[cfg(doc)]
use crate::telemetry::user_agent::{Browser, Os};

pub const VIEW_START_TOTAL: &str = "view_start_total";
pub const VIEWERS_CURRENT: &str = "viewers_current";
pub const VIEW_SECONDS_TOTAL: &str = "view_seconds_total";
pub const CATALOG_QUERIES_TOTAL: &str = "vantage_catalog_queries_total";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("camera_id is required")]
    MissingCameraId,
    #[error("seconds must be a positive, finite number (got {0})")]
    InvalidDuration(f64),
    #[error("seconds must not exceed {max} (got {got})")]
    DurationTooLarge { got: f64, max: f64 },
    #[error("metrics instrument error: {0}")]
    Instrument(#[from] prometheus::Error),
    #[error("metrics snapshot is not valid UTF-8")]
    Snapshot,
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQueryKind {
    List,
    Get,
}

impl CatalogQueryKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CatalogQueryKind::List => "list",
            CatalogQueryKind::Get => "get",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQueryOutcome {
    Ok,
    NotFound,
    Error,
}

impl CatalogQueryOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CatalogQueryOutcome::Ok => "ok",
            CatalogQueryOutcome::NotFound => "not_found",
            CatalogQueryOutcome::Error => "error",
        }
    }
}

/// Surrounding whitespace is not part of the id
fn require_camera_id(camera_id: &str) -> TelemetryResult<&str> {
    let camera_id = camera_id.trim();
    if camera_id.is_empty() {
        return Err(TelemetryError::MissingCameraId);
    }
    Ok(camera_id)
}

pub struct TelemetryRegistry {
    registry: Registry,
    view_start_total: IntCounterVec,
    viewers_current: IntGaugeVec,
    view_seconds_total: CounterVec,
    catalog_queries_total: IntCounterVec,
}

impl TelemetryRegistry {
    /// Create the registry and register all instruments on it
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let view_start_total = IntCounterVec::new(
            Opts::new(VIEW_START_TOTAL, "Viewing sessions started"),
            &["camera_id", "country", "browser", "os"],
        )?;
        let viewers_current = IntGaugeVec::new(
            Opts::new(VIEWERS_CURRENT, "Viewers currently watching"),
            &["camera_id", "country"],
        )?;
        let view_seconds_total = CounterVec::new(
            Opts::new(VIEW_SECONDS_TOTAL, "Seconds watched, as reported by heartbeats"),
            &["camera_id", "country"],
        )?;
        let catalog_queries_total = IntCounterVec::new(
            Opts::new(CATALOG_QUERIES_TOTAL, "Catalog queries served, by outcome"),
            &["kind", "outcome"],
        )?;

        registry.register(Box::new(view_start_total.clone()))?;
        registry.register(Box::new(viewers_current.clone()))?;
        registry.register(Box::new(view_seconds_total.clone()))?;
        registry.register(Box::new(catalog_queries_total.clone()))?;

        Ok(Self {
            registry,
            view_start_total,
            viewers_current,
            view_seconds_total,
            catalog_queries_total,
        })
    }

    /// Count a session start and one more current viewer
    pub fn record_view_start(&self, camera_id: &str, ctx: &ClientContext) -> TelemetryResult<()> {
        let camera_id = require_camera_id(camera_id)?;

        self.view_start_total
            .get_metric_with_label_values(&[
                camera_id,
                ctx.country.as_str(),
                ctx.browser.as_str(),
                ctx.os.as_str(),
            ])?
            .inc();
        self.viewers_current
            .get_metric_with_label_values(&[camera_id, ctx.country.as_str()])?
            .inc();

        debug!(camera_id, country = %ctx.country, browser = %ctx.browser, os = %ctx.os, "view start");
        Ok(())
    }

    /// Add reported watch time. The duration is validated by the caller's
    /// heartbeat policy.
    pub fn record_heartbeat(
        &self,
        camera_id: &str,
        ctx: &ClientContext,
        seconds: f64,
    ) -> TelemetryResult<()> {
        let camera_id = require_camera_id(camera_id)?;
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(TelemetryError::InvalidDuration(seconds));
        }

        self.view_seconds_total
            .get_metric_with_label_values(&[camera_id, ctx.country.as_str()])?
            .inc_by(seconds);
        Ok(())
    }

    /// One viewer fewer. Not clamped: an end without a matching start takes
    /// the gauge below zero.
    pub fn record_view_end(&self, camera_id: &str, ctx: &ClientContext) -> TelemetryResult<()> {
        let camera_id = require_camera_id(camera_id)?;

        self.viewers_current
            .get_metric_with_label_values(&[camera_id, ctx.country.as_str()])?
            .dec();

        debug!(camera_id, country = %ctx.country, "view end");
        Ok(())
    }

    pub fn record_catalog_query(&self, kind: CatalogQueryKind, outcome: CatalogQueryOutcome) {
        if let Ok(counter) = self
            .catalog_queries_total
            .get_metric_with_label_values(&[kind.as_str(), outcome.as_str()])
        {
            counter.inc();
        }
    }

    /// Content type of [`TelemetryRegistry::snapshot`]
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Serialize every instrument in the Prometheus text exposition format
    pub fn snapshot(&self) -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|_| TelemetryError::Snapshot)
    }

    /// Current `view_start_total` for the exact label tuple
    pub fn view_starts(&self, camera_id: &str, ctx: &ClientContext) -> u64 {
        self.sample(
            VIEW_START_TOTAL,
            &[
                ("camera_id", camera_id),
                ("country", ctx.country.as_str()),
                ("browser", ctx.browser.as_str()),
                ("os", ctx.os.as_str()),
            ],
        )
        .map(|v| v as u64)
        .unwrap_or(0)
    }

    /// Current `viewers_current` for a camera and country
    pub fn viewers(&self, camera_id: &str, country: &str) -> i64 {
        self.sample(
            VIEWERS_CURRENT,
            &[("camera_id", camera_id), ("country", country)],
        )
        .map(|v| v as i64)
        .unwrap_or(0)
    }

    /// Current `view_seconds_total` for a camera and country
    pub fn watched_seconds(&self, camera_id: &str, country: &str) -> f64 {
        self.sample(
            VIEW_SECONDS_TOTAL,
            &[("camera_id", camera_id), ("country", country)],
        )
        .unwrap_or(0.0)
    }

    /// Number of series currently held by an instrument
    pub fn series_count(&self, name: &str) -> usize {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == name)
            .map(|family| family.get_metric().len())
            .unwrap_or(0)
    }

    /// Read a series without creating it
    fn sample(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let families = self.registry.gather();
        let family = families.iter().find(|family| family.get_name() == name)?;

        let metric = family.get_metric().iter().find(|metric| {
            let pairs = metric.get_label();
            pairs.len() == labels.len()
                && labels.iter().all(|(key, value)| {
                    pairs
                        .iter()
                        .any(|pair| pair.get_name() == *key && pair.get_value() == *value)
                })
        })?;

        match family.get_field_type() {
            MetricType::COUNTER => Some(metric.get_counter().get_value()),
            MetricType::GAUGE => Some(metric.get_gauge().get_value()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::user_agent::{Browser, Os};

    fn ctx(country: &str) -> ClientContext {
        ClientContext::new(country, Browser::Chrome, Os::Windows)
    }

    #[test]
    fn test_three_starts_one_end() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("US");

        for _ in 0..3 {
            telemetry.record_view_start("cam1", &ctx).unwrap();
        }
        telemetry.record_view_end("cam1", &ctx).unwrap();

        assert_eq!(telemetry.viewers("cam1", "US"), 2);
        assert_eq!(telemetry.view_starts("cam1", &ctx), 3);
    }

    #[test]
    fn test_start_then_end_returns_to_baseline() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let us = ctx("US");
        let de = ctx("DE");

        telemetry.record_view_start("cam1", &us).unwrap();
        let baseline = telemetry.viewers("cam1", "US");

        // Interleave with other cameras and contexts
        for _ in 0..5 {
            telemetry.record_view_start("cam1", &us).unwrap();
            telemetry.record_view_start("cam2", &us).unwrap();
            telemetry.record_view_start("cam1", &de).unwrap();
        }
        for _ in 0..5 {
            telemetry.record_view_end("cam1", &de).unwrap();
            telemetry.record_view_end("cam1", &us).unwrap();
        }

        assert_eq!(telemetry.viewers("cam1", "US"), baseline);
        assert_eq!(telemetry.viewers("cam1", "DE"), 0);
        assert_eq!(telemetry.viewers("cam2", "US"), 5);
    }

    #[test]
    fn test_gauge_goes_negative_on_unmatched_end() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("unknown");

        telemetry.record_view_end("cam1", &ctx).unwrap();
        telemetry.record_view_end("cam1", &ctx).unwrap();

        assert_eq!(telemetry.viewers("cam1", "unknown"), -2);
    }

    #[test]
    fn test_viewer_gauge_ignores_browser_and_os() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let chrome = ClientContext::new("US", Browser::Chrome, Os::Windows);
        let safari = ClientContext::new("US", Browser::Safari, Os::Ios);

        telemetry.record_view_start("cam1", &chrome).unwrap();
        telemetry.record_view_start("cam1", &safari).unwrap();
        telemetry.record_view_end("cam1", &safari).unwrap();

        assert_eq!(telemetry.viewers("cam1", "US"), 1);
        assert_eq!(telemetry.view_starts("cam1", &chrome), 1);
        assert_eq!(telemetry.view_starts("cam1", &safari), 1);
        assert_eq!(telemetry.series_count(VIEW_START_TOTAL), 2);
        assert_eq!(telemetry.series_count(VIEWERS_CURRENT), 1);
    }

    #[test]
    fn test_heartbeat_accumulates_seconds() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("US");

        telemetry.record_heartbeat("cam1", &ctx, 10.0).unwrap();
        telemetry.record_heartbeat("cam1", &ctx, 2.5).unwrap();

        assert_eq!(telemetry.watched_seconds("cam1", "US"), 12.5);
        assert_eq!(telemetry.watched_seconds("cam1", "DE"), 0.0);
    }

    #[test]
    fn test_heartbeat_rejects_invalid_durations() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("US");

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                telemetry.record_heartbeat("cam1", &ctx, bad),
                Err(TelemetryError::InvalidDuration(_))
            ));
        }
        assert_eq!(telemetry.series_count(VIEW_SECONDS_TOTAL), 0);
    }

    #[test]
    fn test_missing_camera_id_is_rejected() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("US");

        assert!(matches!(
            telemetry.record_view_start("", &ctx),
            Err(TelemetryError::MissingCameraId)
        ));
        assert!(matches!(
            telemetry.record_view_end("   ", &ctx),
            Err(TelemetryError::MissingCameraId)
        ));
        assert!(matches!(
            telemetry.record_heartbeat("", &ctx, 10.0),
            Err(TelemetryError::MissingCameraId)
        ));
        assert_eq!(telemetry.series_count(VIEWERS_CURRENT), 0);
    }

    #[test]
    fn test_camera_id_is_trimmed_before_labelling() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("US");

        telemetry.record_view_start(" cam1 ", &ctx).unwrap();
        telemetry.record_view_start("cam1", &ctx).unwrap();
        telemetry.record_heartbeat("\tcam1", &ctx, 4.0).unwrap();
        telemetry.record_view_end("cam1\n", &ctx).unwrap();

        assert_eq!(telemetry.view_starts("cam1", &ctx), 2);
        assert_eq!(telemetry.viewers("cam1", "US"), 1);
        assert_eq!(telemetry.viewers(" cam1 ", "US"), 0);
        assert_eq!(telemetry.watched_seconds("cam1", "US"), 4.0);
        assert_eq!(telemetry.series_count(VIEW_START_TOTAL), 1);
        assert_eq!(telemetry.series_count(VIEWERS_CURRENT), 1);
    }

    #[test]
    fn test_snapshot_exposition_format() {
        let telemetry = TelemetryRegistry::new().unwrap();
        let ctx = ctx("US");

        telemetry.record_view_start("cam1", &ctx).unwrap();
        telemetry.record_heartbeat("cam1", &ctx, 10.0).unwrap();

        let snapshot = telemetry.snapshot().unwrap();
        assert!(snapshot.contains("# TYPE view_start_total counter"));
        assert!(snapshot.contains("# TYPE viewers_current gauge"));
        assert!(snapshot.contains("# TYPE view_seconds_total counter"));
        let start_line = snapshot
            .lines()
            .find(|line| line.starts_with("view_start_total{"))
            .unwrap();
        for label in [
            r#"camera_id="cam1""#,
            r#"country="US""#,
            r#"browser="Chrome""#,
            r#"os="Windows""#,
        ] {
            assert!(start_line.contains(label), "missing {label} in {start_line}");
        }
        assert!(start_line.ends_with("} 1"));
        assert!(snapshot.contains(r#"viewers_current{camera_id="cam1",country="US"} 1"#));
        assert!(snapshot.contains(r#"view_seconds_total{camera_id="cam1",country="US"} 10"#));
        assert!(telemetry.content_type().starts_with("text/plain"));
    }

    #[test]
    fn test_catalog_query_counter() {
        let telemetry = TelemetryRegistry::new().unwrap();
        telemetry.record_catalog_query(CatalogQueryKind::Get, CatalogQueryOutcome::NotFound);
        telemetry.record_catalog_query(CatalogQueryKind::Get, CatalogQueryOutcome::NotFound);

        let snapshot = telemetry.snapshot().unwrap();
        assert!(snapshot
            .contains(r#"vantage_catalog_queries_total{kind="get",outcome="not_found"} 2"#));
    }

    #[test]
    fn test_registries_are_isolated() {
        let a = TelemetryRegistry::new().unwrap();
        let b = TelemetryRegistry::new().unwrap();
        a.record_view_start("cam1", &ctx("US")).unwrap();

        assert_eq!(a.viewers("cam1", "US"), 1);
        assert_eq!(b.viewers("cam1", "US"), 0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let telemetry = std::sync::Arc::new(TelemetryRegistry::new().unwrap());
        let ctx = ctx("US");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let telemetry = std::sync::Arc::clone(&telemetry);
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        telemetry.record_view_start("cam1", &ctx).unwrap();
                        telemetry.record_view_end("cam1", &ctx).unwrap();
                        telemetry.record_view_start("cam1", &ctx).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(telemetry.view_starts("cam1", &ctx), 16_000);
        assert_eq!(telemetry.viewers("cam1", "US"), 8_000);
    }
}

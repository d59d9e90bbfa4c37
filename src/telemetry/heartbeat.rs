use crate::telemetry::registry::{TelemetryError, TelemetryResult};

pub const DEFAULT_HEARTBEAT_SECS: f64 = 10.0;
pub const DEFAULT_MAX_HEARTBEAT_SECS: f64 = 3600.0;

/// Resolves the duration credited by a single heartbeat.
///
/// Clients report watch time themselves. The optional upper bound caps what
/// one report can add; it does not track sessions or suppress duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartbeatPolicy {
    pub default_secs: f64,
    /// `None` accepts any positive duration
    pub max_secs: Option<f64>,
}

impl HeartbeatPolicy {
    pub fn new(default_secs: f64, max_secs: Option<f64>) -> Self {
        Self {
            default_secs,
            max_secs,
        }
    }

    pub fn resolve(&self, requested: Option<f64>) -> TelemetryResult<f64> {
        let seconds = requested.unwrap_or(self.default_secs);
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(TelemetryError::InvalidDuration(seconds));
        }

        match self.max_secs {
            Some(max) if seconds > max => Err(TelemetryError::DurationTooLarge { got: seconds, max }),
            _ => Ok(seconds),
        }
    }
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_SECS, Some(DEFAULT_MAX_HEARTBEAT_SECS))
    }
}

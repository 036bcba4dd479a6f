use std::time::Duration;

use serde::Deserialize;

use crate::error::PacerError;
use crate::error::Result;

/// Extra delay added beyond a provider-stated reset to absorb clock skew
pub const SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Upper bound of the jitter added to minimum-interval waits
pub const INTERVAL_JITTER: Duration = Duration::from_secs(2);

/// Fixed backoff after an explicit 429 rejection
pub const REJECTION_BACKOFF: Duration = Duration::from_secs(65);

/// Upper bound of the jitter added to the 429 backoff
pub const REJECTION_JITTER: Duration = Duration::from_secs(5);

/// Reset delay assumed when the provider omits the reset header
pub const DEFAULT_QUOTA_RESET: Duration = Duration::from_secs(60);

/// Longest reset delay taken from a provider header; larger values are clamped
pub const MAX_QUOTA_RESET: Duration = Duration::from_secs(31 * 24 * 60 * 60);

/// Upper bound for both the window and the minimum interval
pub const MAX_WINDOW: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Pacing limits, immutable once a pacer is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacerConfig {
    /// Maximum admissions inside any rolling window
    pub max_requests_per_window: u32,

    /// Length of the rolling window
    pub window: Duration,

    /// Minimum spacing between consecutive admissions (zero disables the check)
    pub min_interval: Duration,

    /// Sleep through an exhausted quota instead of failing with `QuotaExhausted`
    pub wait_on_quota_exhausted: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self { max_requests_per_window: 5, window: Duration::from_secs(60), min_interval: Duration::from_secs(13), wait_on_quota_exhausted: true }
    }
}

impl PacerConfig {
    /// Free-tier profile: one request per interval, never more than the window allows
    pub fn strict() -> Self {
        Self { max_requests_per_window: 1, min_interval: Duration::from_secs(60), ..Default::default() }
    }

    /// Fail-fast variant of the defaults for batch jobs that rotate credentials
    pub fn fail_fast() -> Self {
        Self { wait_on_quota_exhausted: false, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_requests_per_window == 0 {
            return Err(PacerError::invalid_config("max_requests_per_window must be greater than 0"));
        }
        if self.window.is_zero() {
            return Err(PacerError::invalid_config("window must be greater than 0"));
        }
        if self.window > MAX_WINDOW {
            return Err(PacerError::invalid_config(format!("window must not exceed {:?}, got {:?}", MAX_WINDOW, self.window)));
        }
        if self.min_interval > MAX_WINDOW {
            return Err(PacerError::invalid_config(format!("min_interval must not exceed {:?}, got {:?}", MAX_WINDOW, self.min_interval)));
        }
        Ok(())
    }
}

/// Raw pacer settings as they appear in a configuration file
///
/// Durations are given in seconds. Values are checked when converted into a
/// [`PacerConfig`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacerSettings {
    pub max_requests_per_window: i64,
    pub window_secs: f64,
    pub min_interval_secs: f64,
    pub wait_on_quota_exhausted: bool,
}

impl Default for PacerSettings {
    fn default() -> Self {
        Self { max_requests_per_window: 5, window_secs: 60.0, min_interval_secs: 13.0, wait_on_quota_exhausted: true }
    }
}

impl TryFrom<PacerSettings> for PacerConfig {
    type Error = PacerError;

    fn try_from(settings: PacerSettings) -> Result<Self> {
        if settings.max_requests_per_window <= 0 {
            return Err(PacerError::invalid_config(format!(
                "max_requests_per_window must be greater than 0, got {}",
                settings.max_requests_per_window
            )));
        }
        let max_requests_per_window = u32::try_from(settings.max_requests_per_window)
            .map_err(|_| PacerError::invalid_config(format!("max_requests_per_window {} is too large", settings.max_requests_per_window)))?;

        if !(settings.window_secs.is_finite() && settings.window_secs > 0.0) {
            return Err(PacerError::invalid_config(format!("window_secs must be a positive number, got {}", settings.window_secs)));
        }
        if !(settings.min_interval_secs.is_finite() && settings.min_interval_secs >= 0.0) {
            return Err(PacerError::invalid_config(format!("min_interval_secs must not be negative, got {}", settings.min_interval_secs)));
        }

        let window = Duration::try_from_secs_f64(settings.window_secs)
            .map_err(|_| PacerError::invalid_config(format!("window_secs {} is out of range", settings.window_secs)))?;
        let min_interval = Duration::try_from_secs_f64(settings.min_interval_secs)
            .map_err(|_| PacerError::invalid_config(format!("min_interval_secs {} is out of range", settings.min_interval_secs)))?;

        let config = PacerConfig {
            max_requests_per_window,
            window,
            min_interval,
            wait_on_quota_exhausted: settings.wait_on_quota_exhausted,
        };
        config.validate()?;
        Ok(config)
    }
}

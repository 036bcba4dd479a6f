use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Result type for pacing operations
pub type Result<T> = std::result::Result<T, PacerError>;

/// Errors surfaced by the pacer
///
/// Header problems never show up here: a missing or malformed quota header is
/// treated as "no signal".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacerError {
    /// Rejected at construction, never at call time
    #[error("Invalid pacer configuration: {0}")]
    InvalidConfig(String),

    /// The provider reported zero remaining quota and the pacer is configured
    /// to fail fast instead of sleeping through the reset
    #[error("Quota exhausted, resets in {reset_in:?}")]
    QuotaExhausted {
        /// Instant at which the provider said the quota resets
        reset_at: Instant,
        /// Reset delay as reported (or defaulted) when the error was raised
        reset_in: Duration,
    },
}

impl PacerError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        PacerError::InvalidConfig(msg.into())
    }

    /// Whether the caller can recover by waiting or switching credentials
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, PacerError::QuotaExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PacerError::invalid_config("window must be greater than 0");
        assert_eq!(err.to_string(), "Invalid pacer configuration: window must be greater than 0");

        let err = PacerError::QuotaExhausted { reset_at: Instant::now(), reset_in: Duration::from_secs(30) };
        assert_eq!(err.to_string(), "Quota exhausted, resets in 30s");
        assert!(err.is_quota_exhausted());
    }
}

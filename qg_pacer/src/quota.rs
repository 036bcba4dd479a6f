//! Quota signals carried in provider response headers

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::time::Duration;

use crate::config::MAX_QUOTA_RESET;

/// Header carrying the number of requests left in the provider's quota
pub const REMAINING_HEADER: &str = "x-ratelimit-requests-remaining";

/// Header carrying the seconds until the provider's quota resets
pub const RESET_HEADER: &str = "x-ratelimit-requests-reset";

/// Read-only view over response headers
///
/// Header names are case-insensitive; implementations must match ignoring
/// ASCII case.
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> HeaderSource for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.get(name) {
            return Some(value.as_str());
        }
        self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

impl HeaderSource for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.get(name) {
            return Some(value.as_str());
        }
        self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> HeaderSource for [(K, V)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter().find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name)).map(|(_, value)| value.as_ref())
    }
}

impl<K: AsRef<str>, V: AsRef<str>, const N: usize> HeaderSource for [(K, V); N] {
    fn header(&self, name: &str) -> Option<&str> {
        self.as_slice().header(name)
    }
}

/// Quota state reported by the provider on one response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSignal {
    /// Requests left, if the provider reported a parseable value
    pub remaining: Option<i64>,

    /// Time until reset, if reported; clamped to `[0, MAX_QUOTA_RESET]`
    pub reset: Option<Duration>,
}

impl QuotaSignal {
    /// Parse the quota headers; missing or non-numeric values become `None`
    pub fn from_headers<H: HeaderSource + ?Sized>(headers: &H) -> Self {
        let remaining = headers.header(REMAINING_HEADER).and_then(parse_integer);
        let reset = headers.header(RESET_HEADER).and_then(parse_integer).map(|secs| Duration::from_secs(secs.max(0) as u64).min(MAX_QUOTA_RESET));
        Self { remaining, reset }
    }

    /// True when the provider reported zero (or negative) remaining requests
    pub fn is_exhausted(&self) -> bool {
        matches!(self.remaining, Some(remaining) if remaining <= 0)
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_present_headers() {
        let headers = [(REMAINING_HEADER, "12"), (RESET_HEADER, "30")];
        let signal = QuotaSignal::from_headers(&headers);

        assert_eq!(signal.remaining, Some(12));
        assert_eq!(signal.reset, Some(Duration::from_secs(30)));
        assert!(!signal.is_exhausted());
    }

    #[test]
    fn test_missing_headers() {
        let headers: HashMap<String, String> = HashMap::new();
        assert_eq!(QuotaSignal::from_headers(&headers), QuotaSignal::default());
    }

    #[test]
    fn test_malformed_values_are_absent() {
        let headers = [(REMAINING_HEADER, "plenty"), (RESET_HEADER, "12.5")];
        let signal = QuotaSignal::from_headers(&headers);

        assert_eq!(signal.remaining, None);
        assert_eq!(signal.reset, None);
        assert!(!signal.is_exhausted());
    }

    #[test]
    fn test_exhausted() {
        assert!(QuotaSignal::from_headers(&[(REMAINING_HEADER, "0")]).is_exhausted());
        assert!(QuotaSignal::from_headers(&[(REMAINING_HEADER, " -1 ")]).is_exhausted());
    }

    #[test]
    fn test_negative_reset_clamped() {
        let signal = QuotaSignal::from_headers(&[(RESET_HEADER, "-5")]);
        assert_eq!(signal.reset, Some(Duration::ZERO));
    }

    #[test]
    fn test_huge_reset_clamped() {
        let signal = QuotaSignal::from_headers(&[(RESET_HEADER, "9223372036854775807")]);
        assert_eq!(signal.reset, Some(MAX_QUOTA_RESET));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = HashMap::new();
        headers.insert("X-RateLimit-Requests-Remaining".to_string(), "0".to_string());

        let mut ordered = BTreeMap::new();
        ordered.insert("X-RATELIMIT-REQUESTS-RESET".to_string(), "45".to_string());

        assert_eq!(headers.header(REMAINING_HEADER), Some("0"));
        assert_eq!(ordered.header(RESET_HEADER), Some("45"));
    }
}

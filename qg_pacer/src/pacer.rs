use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::clock::Clock;
use crate::clock::TokioClock;
use crate::config::DEFAULT_QUOTA_RESET;
use crate::config::INTERVAL_JITTER;
use crate::config::PacerConfig;
use crate::config::REJECTION_BACKOFF;
use crate::config::REJECTION_JITTER;
use crate::config::SAFETY_MARGIN;
use crate::error::PacerError;
use crate::error::Result;
use crate::jitter::Jitter;
use crate::jitter::UniformJitter;
use crate::quota::HeaderSource;
use crate::quota::QuotaSignal;
use crate::request_log::RequestLog;

/// HTTP status for an explicit "too many requests" rejection
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Consecutive window waits inside one `admit` after which each further cycle is logged
pub const WINDOW_CYCLE_WARN_THRESHOLD: u32 = 8;

/// Mutable pacing state, touched only by `admit` and `observe`
#[derive(Debug, Clone, Default)]
pub struct PacerState {
    last_request: Option<Instant>,
    log: RequestLog,
    quota_reset_at: Option<Instant>,
}

/// Client-side guard in front of a quota-limited API
///
/// Call [`Pacer::admit`] before every request and [`Pacer::observe`] with the
/// response headers and status afterwards. Both take `&mut self`: one pacer
/// serves one stream of requests. Use [`crate::SharedPacer`] when several tasks
/// feed the same quota.
pub struct Pacer<C = TokioClock, J = UniformJitter> {
    config: PacerConfig,
    clock: C,
    jitter: J,
    state: PacerState,
}

impl Pacer {
    /// Create a pacer on the tokio clock with OS-seeded jitter
    pub fn new(config: PacerConfig) -> Result<Self> {
        Self::with_parts(config, TokioClock, UniformJitter::new())
    }

    /// Create a builder starting from the default limits
    pub fn builder() -> PacerBuilder {
        PacerBuilder::new()
    }
}

impl<C: Clock, J: Jitter> Pacer<C, J> {
    /// Create a pacer from explicit clock and jitter sources
    pub fn with_parts(config: PacerConfig, clock: C, jitter: J) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clock, jitter, state: PacerState::default() })
    }

    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Admission times still tracked for the sliding window
    pub fn request_log(&self) -> &RequestLog {
        &self.state.log
    }

    pub fn last_request(&self) -> Option<Instant> {
        self.state.last_request
    }

    /// Reset instant computed from the most recent exhausted-quota response
    pub fn quota_reset_at(&self) -> Option<Instant> {
        self.state.quota_reset_at
    }

    /// Wait until one more request fits the interval and window limits, then record it
    ///
    /// After a window wait the interval and window are checked again from the
    /// top, since the wait itself may have changed which entries matter.
    pub async fn admit(&mut self) {
        let mut window_cycles: u32 = 0;

        loop {
            let mut now = self.clock.now();

            if let Some(last) = self.state.last_request {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.config.min_interval {
                    let wait = (self.config.min_interval - elapsed) + self.jitter.sample(INTERVAL_JITTER);
                    debug!(wait_secs = wait.as_secs_f64(), "Interval wait");
                    self.clock.sleep(wait).await;
                    now = self.clock.now();
                }
            }

            self.state.log.prune(now, self.config.window);

            if self.state.log.len() >= self.config.max_requests_per_window as usize {
                if let Some(wait) = self.window_wait(now) {
                    window_cycles += 1;
                    if window_cycles > WINDOW_CYCLE_WARN_THRESHOLD {
                        warn!(cycles = window_cycles, "Admission still blocked after repeated window waits");
                    }
                    warn!(wait_secs = wait.as_secs_f64(), in_window = self.state.log.len(), "Rate limit window full");
                    self.clock.sleep(wait).await;
                    continue;
                }
            }

            let now = self.clock.now();
            self.state.last_request = Some(now);
            self.state.log.push(now);
            return;
        }
    }

    /// Time until the oldest tracked request leaves the window, plus the safety margin
    fn window_wait(&self, now: Instant) -> Option<Duration> {
        let oldest = self.state.log.oldest()?;
        let hold = self.config.window + SAFETY_MARGIN;
        let wait = match oldest.checked_add(hold) {
            Some(free_at) => free_at.saturating_duration_since(now),
            None => hold,
        };
        (!wait.is_zero()).then_some(wait)
    }

    /// Inspect a completed response and apply any corrective delay
    ///
    /// Returns `Ok(true)` when the pacer slept: after a 429 rejection, or after
    /// an exhausted quota when configured to wait. With
    /// `wait_on_quota_exhausted` disabled an exhausted quota is returned as
    /// [`PacerError::QuotaExhausted`] without sleeping.
    pub async fn observe<H: HeaderSource + ?Sized>(&mut self, headers: &H, status: u16) -> Result<bool> {
        if status == TOO_MANY_REQUESTS {
            let wait = REJECTION_BACKOFF + self.jitter.sample(REJECTION_JITTER);
            warn!(wait_secs = wait.as_secs_f64(), "Status 429 received, backing off");
            self.clock.sleep(wait).await;
            self.state.log.clear();
            return Ok(true);
        }

        let signal = QuotaSignal::from_headers(headers);
        if !signal.is_exhausted() {
            return Ok(false);
        }

        let now = self.clock.now();
        let (reset_in, reset_at) = match signal.reset.and_then(|reset| now.checked_add(reset).map(|at| (reset, at))) {
            Some(checked) => checked,
            None => (DEFAULT_QUOTA_RESET, now.checked_add(DEFAULT_QUOTA_RESET).unwrap_or(now)),
        };
        self.state.quota_reset_at = Some(reset_at);

        if !self.config.wait_on_quota_exhausted {
            error!(reset_in_secs = reset_in.as_secs(), "Quota exhausted");
            return Err(PacerError::QuotaExhausted { reset_at, reset_in });
        }

        let wait = reset_in + SAFETY_MARGIN;
        warn!(wait_secs = wait.as_secs(), "Quota exhausted, waiting for reset");
        self.clock.sleep(wait).await;
        self.state.log.clear();
        Ok(true)
    }
}

/// Builder for configuring a pacer
///
/// Clock and jitter sources default to [`TokioClock`] and [`UniformJitter`];
/// swapping them changes the builder's type.
pub struct PacerBuilder<C = TokioClock, J = UniformJitter> {
    config: PacerConfig,
    clock: C,
    jitter: J,
}

impl PacerBuilder {
    pub fn new() -> Self {
        Self { config: PacerConfig::default(), clock: TokioClock, jitter: UniformJitter::new() }
    }
}

impl Default for PacerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, J: Jitter> PacerBuilder<C, J> {
    /// Replace every limit at once
    pub fn config(mut self, config: PacerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_requests_per_window(mut self, max: u32) -> Self {
        self.config.max_requests_per_window = max;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.config.min_interval = min_interval;
        self
    }

    pub fn wait_on_quota_exhausted(mut self, wait: bool) -> Self {
        self.config.wait_on_quota_exhausted = wait;
        self
    }

    pub fn clock<C2: Clock>(self, clock: C2) -> PacerBuilder<C2, J> {
        PacerBuilder { config: self.config, clock, jitter: self.jitter }
    }

    pub fn jitter<J2: Jitter>(self, jitter: J2) -> PacerBuilder<C, J2> {
        PacerBuilder { config: self.config, clock: self.clock, jitter }
    }

    /// Build the pacer, validating the limits
    pub fn build(self) -> Result<Pacer<C, J>> {
        Pacer::with_parts(self.config, self.clock, self.jitter)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MAX_QUOTA_RESET;
    use crate::config::MAX_WINDOW;
    use crate::jitter::FixedJitter;
    use crate::jitter::NoJitter;
    use crate::quota::REMAINING_HEADER;
    use crate::quota::RESET_HEADER;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn manual_pacer(config: PacerConfig) -> (Pacer<ManualClock, NoJitter>, ManualClock) {
        let clock = ManualClock::new();
        let pacer = Pacer::builder().config(config).clock(clock.clone()).jitter(NoJitter).build().unwrap();
        (pacer, clock)
    }

    fn no_headers() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Pacer::builder().max_requests_per_window(0).build();
        assert!(matches!(result, Err(PacerError::InvalidConfig(_))));

        let result = Pacer::builder().window(Duration::ZERO).build();
        assert!(matches!(result, Err(PacerError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_first_admit_never_waits() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());

        pacer.admit().await;

        assert!(clock.sleeps().is_empty());
        assert_eq!(pacer.request_log().len(), 1);
        assert_eq!(pacer.last_request(), Some(clock.now()));
    }

    #[tokio::test]
    async fn test_min_interval_wait() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());

        pacer.admit().await;
        clock.advance(secs(4));
        pacer.admit().await;

        // 13s interval, 4s already elapsed
        assert_eq!(clock.sleeps(), vec![secs(9)]);
        assert_eq!(pacer.request_log().len(), 2);
    }

    #[tokio::test]
    async fn test_min_interval_includes_jitter() {
        let clock = ManualClock::new();
        let mut pacer = Pacer::builder().clock(clock.clone()).jitter(FixedJitter(Duration::from_millis(1500))).build().unwrap();

        pacer.admit().await;
        pacer.admit().await;

        assert_eq!(clock.sleeps(), vec![secs(13) + Duration::from_millis(1500)]);
    }

    #[tokio::test]
    async fn test_no_wait_once_interval_elapsed() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());

        pacer.admit().await;
        clock.advance(secs(20));
        pacer.admit().await;

        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_window_full_scenario() {
        let config = PacerConfig { max_requests_per_window: 2, window: secs(10), min_interval: Duration::ZERO, ..Default::default() };
        let (mut pacer, clock) = manual_pacer(config);
        let first = clock.now();

        pacer.admit().await;
        pacer.admit().await;
        pacer.admit().await;

        // Third admission waits until first + window + safety margin
        assert_eq!(clock.sleeps(), vec![secs(15)]);
        assert_eq!(pacer.last_request(), Some(first + secs(15)));
        // Both earlier entries are older than the window by then
        assert_eq!(pacer.request_log().len(), 1);
    }

    #[tokio::test]
    async fn test_window_wait_rechecks_interval() {
        let config = PacerConfig { max_requests_per_window: 1, window: secs(10), min_interval: secs(30), ..Default::default() };
        let (mut pacer, clock) = manual_pacer(config);

        pacer.admit().await;
        pacer.admit().await;

        // Interval wait alone clears the window, so no window wait follows
        assert_eq!(clock.sleeps(), vec![secs(30)]);
        assert_eq!(pacer.request_log().len(), 1);
    }

    #[tokio::test]
    async fn test_window_wait_restarts_loop() {
        let config = PacerConfig { max_requests_per_window: 3, window: secs(60), min_interval: secs(1), ..Default::default() };
        let (mut pacer, clock) = manual_pacer(config);
        let first = clock.now();

        for _ in 0..4 {
            pacer.admit().await;
        }

        // Three interval waits, then the window wait for the entry at t=0
        assert_eq!(clock.sleeps(), vec![secs(1), secs(1), secs(1), secs(62)]);
        assert_eq!(pacer.last_request(), Some(first + secs(65)));
        assert_eq!(pacer.request_log().len(), 1);
    }

    #[tokio::test]
    async fn test_observe_429_backs_off_and_clears() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());
        pacer.admit().await;

        let delayed = pacer.observe(&no_headers(), TOO_MANY_REQUESTS).await.unwrap();

        assert!(delayed);
        assert_eq!(clock.sleeps(), vec![REJECTION_BACKOFF]);
        assert!(pacer.request_log().is_empty());
    }

    #[tokio::test]
    async fn test_observe_429_ignores_quota_headers() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::fail_fast());
        let headers = [(REMAINING_HEADER, "0"), (RESET_HEADER, "30")];

        let delayed = pacer.observe(&headers, TOO_MANY_REQUESTS).await.unwrap();

        assert!(delayed);
        assert_eq!(clock.sleeps(), vec![REJECTION_BACKOFF]);
        assert_eq!(pacer.quota_reset_at(), None);
    }

    #[tokio::test]
    async fn test_observe_429_jitter_bounded() {
        let clock = ManualClock::new();
        let mut pacer = Pacer::builder().clock(clock.clone()).jitter(UniformJitter::seeded(3)).build().unwrap();

        pacer.observe(&no_headers(), TOO_MANY_REQUESTS).await.unwrap();

        let slept = clock.total_slept();
        assert!(slept >= REJECTION_BACKOFF);
        assert!(slept < REJECTION_BACKOFF + REJECTION_JITTER);
    }

    #[tokio::test]
    async fn test_observe_exhausted_waits() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());
        pacer.admit().await;
        let start = clock.now();
        let headers = [(REMAINING_HEADER, "0"), (RESET_HEADER, "30")];

        let delayed = pacer.observe(&headers, 200).await.unwrap();

        assert!(delayed);
        assert_eq!(clock.sleeps(), vec![secs(30) + SAFETY_MARGIN]);
        assert_eq!(pacer.quota_reset_at(), Some(start + secs(30)));
        assert!(pacer.request_log().is_empty());
    }

    #[tokio::test]
    async fn test_observe_exhausted_default_reset() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());
        let headers = [(REMAINING_HEADER, "0"), (RESET_HEADER, "soon")];

        assert!(pacer.observe(&headers, 200).await.unwrap());
        assert_eq!(clock.sleeps(), vec![DEFAULT_QUOTA_RESET + SAFETY_MARGIN]);
    }

    #[tokio::test]
    async fn test_observe_huge_reset_does_not_overflow() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::fail_fast());
        let start = clock.now();
        let headers = [(REMAINING_HEADER, "0"), (RESET_HEADER, "9223372036854775807")];

        let err = pacer.observe(&headers, 200).await.unwrap_err();

        assert_eq!(err, PacerError::QuotaExhausted { reset_at: start + MAX_QUOTA_RESET, reset_in: MAX_QUOTA_RESET });
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_largest_window_fills_without_overflow() {
        let config = PacerConfig { max_requests_per_window: 1, window: MAX_WINDOW, min_interval: Duration::ZERO, ..Default::default() };
        let (mut pacer, clock) = manual_pacer(config);

        pacer.admit().await;
        pacer.admit().await;

        assert_eq!(clock.sleeps(), vec![MAX_WINDOW + SAFETY_MARGIN]);
        assert_eq!(pacer.request_log().len(), 1);
    }

    #[test]
    fn test_unbounded_window_rejected() {
        let result = Pacer::builder().max_requests_per_window(1).window(Duration::MAX).min_interval(Duration::ZERO).build();
        assert!(matches!(result, Err(PacerError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_observe_exhausted_fail_fast() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::fail_fast());
        pacer.admit().await;
        let start = clock.now();
        let headers = [(REMAINING_HEADER, "0"), (RESET_HEADER, "30")];

        let err = pacer.observe(&headers, 200).await.unwrap_err();

        assert_eq!(err, PacerError::QuotaExhausted { reset_at: start + secs(30), reset_in: secs(30) });
        assert!(clock.sleeps().is_empty());
        assert_eq!(pacer.quota_reset_at(), Some(start + secs(30)));
        // Fail-fast leaves the window history untouched
        assert_eq!(pacer.request_log().len(), 1);
    }

    #[tokio::test]
    async fn test_observe_no_signal() {
        let (mut pacer, clock) = manual_pacer(PacerConfig::default());
        pacer.admit().await;

        assert!(!pacer.observe(&no_headers(), 200).await.unwrap());
        assert!(!pacer.observe(&[(REMAINING_HEADER, "4")], 200).await.unwrap());
        assert!(!pacer.observe(&[(REMAINING_HEADER, "garbage")], 503).await.unwrap());

        assert!(clock.sleeps().is_empty());
        assert_eq!(pacer.request_log().len(), 1);
        assert_eq!(pacer.quota_reset_at(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_paused() {
        let mut pacer = Pacer::builder().jitter(NoJitter).build().unwrap();
        let start = Instant::now();

        pacer.admit().await;
        pacer.admit().await;

        assert!(Instant::now() - start >= secs(13));
        assert_eq!(pacer.request_log().len(), 2);
    }
}

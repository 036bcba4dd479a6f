use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Time source and sleeper used by the pacer
///
/// All pacing arithmetic goes through `now`, and every wait goes through
/// `sleep`, so a fake implementation can drive the pacer without real delays.
pub trait Clock: Send + Sync {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Suspend the caller for `duration`
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Clock backed by the tokio timer
///
/// Under `#[tokio::test(start_paused = true)]` both `now` and `sleep` follow
/// tokio's virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[derive(Debug)]
struct ManualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Hand-driven clock for tests and simulations
///
/// `sleep` completes immediately after advancing virtual time by the requested
/// duration and records it. Clones share the same timeline, so a test can keep
/// a handle while the pacer owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    /// Create a clock anchored at the current instant
    pub fn new() -> Self {
        Self { origin: Instant::now(), state: Arc::new(Mutex::new(ManualState { elapsed: Duration::ZERO, sleeps: Vec::new() })) }
    }

    /// Move virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.state.lock().elapsed += duration;
    }

    /// Virtual time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// The instant the clock was anchored at
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    /// Sum of all requested sleeps
    pub fn total_slept(&self) -> Duration {
        self.state.lock().sleeps.iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.state.lock().elapsed
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        {
            let mut state = self.state.lock();
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
        Box::pin(std::future::ready(()))
    }
}

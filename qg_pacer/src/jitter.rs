use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Source of random perturbation added to computed waits
pub trait Jitter: Send {
    /// Sample a duration in `[0, upper)`. Returns zero when `upper` is zero.
    fn sample(&mut self, upper: Duration) -> Duration;
}

/// Uniformly distributed jitter
#[derive(Debug, Clone)]
pub struct UniformJitter {
    rng: StdRng,
}

impl UniformJitter {
    /// Jitter seeded from the operating system
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Reproducible jitter for tests and simulations
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for UniformJitter {
    fn sample(&mut self, upper: Duration) -> Duration {
        if upper.is_zero() {
            return Duration::ZERO;
        }
        let upper_nanos = u64::try_from(upper.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(self.rng.random_range(0..upper_nanos))
    }
}

/// Never perturbs; waits are exactly the computed deficit
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    #[inline]
    fn sample(&mut self, _upper: Duration) -> Duration {
        Duration::ZERO
    }
}

/// Constant jitter, clamped below the requested upper bound
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub Duration);

impl Jitter for FixedJitter {
    fn sample(&mut self, upper: Duration) -> Duration {
        if self.0 < upper {
            self.0
        } else {
            upper.saturating_sub(Duration::from_nanos(1))
        }
    }
}

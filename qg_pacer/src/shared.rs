use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::MutexGuard;

use crate::clock::Clock;
use crate::clock::TokioClock;
use crate::error::Result;
use crate::jitter::Jitter;
use crate::jitter::UniformJitter;
use crate::pacer::Pacer;
use crate::quota::HeaderSource;

/// Pacer shared between tasks that draw on the same quota
///
/// Every call takes the lock for its whole duration, including any sleep, so
/// waiting producers queue up behind the one currently paced. Hold the guard
/// from [`SharedPacer::lock`] to keep admit, send and observe together.
pub struct SharedPacer<C = TokioClock, J = UniformJitter> {
    inner: Arc<Mutex<Pacer<C, J>>>,
}

impl<C: Clock, J: Jitter> SharedPacer<C, J> {
    pub fn new(pacer: Pacer<C, J>) -> Self {
        Self { inner: Arc::new(Mutex::new(pacer)) }
    }

    pub async fn admit(&self) {
        self.inner.lock().await.admit().await;
    }

    pub async fn observe<H: HeaderSource + ?Sized>(&self, headers: &H, status: u16) -> Result<bool> {
        self.inner.lock().await.observe(headers, status).await
    }

    /// Exclusive access for a full admit/send/observe sequence
    pub async fn lock(&self) -> MutexGuard<'_, Pacer<C, J>> {
        self.inner.lock().await
    }
}

impl<C, J> Clone for SharedPacer<C, J> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Clock, J: Jitter> From<Pacer<C, J>> for SharedPacer<C, J> {
    fn from(pacer: Pacer<C, J>) -> Self {
        Self::new(pacer)
    }
}

use std::collections::VecDeque;
use std::collections::vec_deque;
use std::time::Duration;

use tokio::time::Instant;

/// Timestamps of admitted requests, oldest first
///
/// Entries are only ever appended at the back, so the log stays sorted
/// ascending and the front entry is always the one that decides how long a
/// full window has to wait.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    entries: VecDeque<Instant>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    /// Append an admission time
    ///
    /// An instant earlier than the newest entry is clamped to it so the log
    /// never goes out of order.
    pub fn push(&mut self, at: Instant) {
        let at = match self.entries.back() {
            Some(&newest) if at < newest => newest,
            _ => at,
        };
        self.entries.push_back(at);
    }

    /// Drop entries strictly older than `window` relative to `now`
    ///
    /// Returns how many entries were removed. An entry exactly `window` old is
    /// still inside the window and is kept.
    pub fn prune(&mut self, now: Instant, window: Duration) -> usize {
        let mut removed = 0;
        while let Some(&oldest) = self.entries.front() {
            if now.saturating_duration_since(oldest) > window {
                self.entries.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// Number of entries whose age relative to `now` is at most `window`
    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.entries.iter().filter(|&&at| now.saturating_duration_since(at) <= window).count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<Instant> {
        self.entries.front().copied()
    }

    pub fn newest(&self) -> Option<Instant> {
        self.entries.back().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Instant> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a RequestLog {
    type Item = &'a Instant;
    type IntoIter = vec_deque::Iter<'a, Instant>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

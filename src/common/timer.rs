use std::time::Duration;
use tokio::time::Instant;

/// Poll-driven timer.
///
/// `reached()` is true once more than `limit` has elapsed since the last reset
/// *and* it has been polled more than `count` times since then. The count keeps
/// a slow screenshot loop from declaring a timeout after one or two samples.
/// A timer that was never started counts as reached.
#[derive(Debug, Clone)]
pub struct Timer {
    limit: Duration,
    count: u32,
    started_at: Option<Instant>,
    reach_count: u32,
}

impl Timer {
    pub fn new(limit: Duration) -> Self {
        Self::with_count(limit, 0)
    }

    pub fn with_count(limit: Duration, count: u32) -> Self {
        Self {
            limit,
            count,
            started_at: None,
            reach_count: count,
        }
    }

    /// One poll per half second of `limit`, the cadence of a typical screenshot loop.
    pub fn with_default_count(limit: Duration) -> Self {
        let count = (limit.as_millis() / 500) as u32;
        Self::with_count(limit, count)
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Duration) {
        self.limit = limit;
    }

    pub fn started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Starts the timer if it is not running yet.
    pub fn start(mut self) -> Self {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            self.reach_count = 0;
        }
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    pub fn reached(&mut self) -> bool {
        self.reach_count = self.reach_count.saturating_add(1);
        let time_reached = match self.started_at {
            Some(started) => started.elapsed() > self.limit,
            None => true,
        };
        time_reached && self.reach_count > self.count
    }

    pub fn reset(&mut self) {
        self.started_at = Some(Instant::now());
        self.reach_count = 0;
    }

    /// Back to the never-started state, which reads as reached.
    pub fn clear(&mut self) {
        self.started_at = None;
        self.reach_count = self.count;
    }

    pub fn reached_and_reset(&mut self) -> bool {
        if self.reached() {
            self.reset();
            true
        } else {
            false
        }
    }
}

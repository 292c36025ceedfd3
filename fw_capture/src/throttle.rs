//! ABOUTME: Minimum-interval gate for snapshot batches
//! ABOUTME: Bounds outbound alerts and disk writes regardless of frame rate

use std::time::{Duration, Instant};
use tracing::debug;

/// Rate limiter for snapshot batches.
///
/// `allow` only inspects; the caller commits with `mark` in the same step it
/// captures. Mode toggles do not touch the throttle.
#[derive(Debug, Clone)]
pub struct SnapshotThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl SnapshotThrottle {
    /// A throttle that permits the first batch immediately
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// A throttle whose cool-down starts at `start`, so the first batch is
    /// possible one interval later
    pub fn primed_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: Some(start),
        }
    }

    pub fn allow(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        debug!(interval_ms = self.interval.as_millis() as u64, "Snapshot throttle marked");
        self.last = Some(now);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

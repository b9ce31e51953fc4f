//! Tick loop metrics and statistics.
//!
//! Tracks tick timing, broadcast counts and cadence overruns of one runner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Tick metrics tracked by a session runner.
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct TickMetrics {
    /// Total number of ticks executed
    ticks: AtomicU64,

    /// Ticks whose processing took at least the tick interval
    overruns: AtomicU64,

    /// `game_state` messages published
    state_broadcasts: AtomicU64,

    /// `elems_update` messages published
    entity_broadcasts: AtomicU64,

    /// Sum of all tick processing times, in nanoseconds
    total_tick_nanos: AtomicU64,

    /// Longest tick processing time, in nanoseconds
    max_tick_nanos: AtomicU64,
}

impl TickMetrics {
    /// Creates a new empty metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed tick and its processing time.
    pub fn record_tick(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.total_tick_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_tick_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcast(&self) {
        self.state_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entity_broadcast(&self) {
        self.entity_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn state_broadcasts(&self) -> u64 {
        self.state_broadcasts.load(Ordering::Relaxed)
    }

    pub fn entity_broadcasts(&self) -> u64 {
        self.entity_broadcasts.load(Ordering::Relaxed)
    }

    /// Calculates average tick processing time.
    pub fn avg_tick_time(&self) -> Duration {
        let ticks = self.ticks();
        if ticks == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_tick_nanos.load(Ordering::Relaxed) / ticks)
        }
    }

    pub fn max_tick_time(&self) -> Duration {
        Duration::from_nanos(self.max_tick_nanos.load(Ordering::Relaxed))
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Note: This is not atomic across all fields - individual fields
    /// are read atomically but the snapshot as a whole may be inconsistent
    /// if metrics are being updated concurrently.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks(),
            overruns: self.overruns(),
            state_broadcasts: self.state_broadcasts(),
            entity_broadcasts: self.entity_broadcasts(),
            avg_tick_time: self.avg_tick_time(),
            max_tick_time: self.max_tick_time(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub overruns: u64,
    pub state_broadcasts: u64,
    pub entity_broadcasts: u64,
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_and_peaks() {
        let metrics = TickMetrics::new();
        assert_eq!(metrics.avg_tick_time(), Duration::ZERO);

        metrics.record_tick(Duration::from_millis(10));
        metrics.record_tick(Duration::from_millis(30));
        metrics.record_overrun();
        metrics.record_state_broadcast();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.overruns, 1);
        assert_eq!(snapshot.state_broadcasts, 1);
        assert_eq!(snapshot.entity_broadcasts, 0);
        assert_eq!(snapshot.avg_tick_time, Duration::from_millis(20));
        assert_eq!(snapshot.max_tick_time, Duration::from_millis(30));
    }
}

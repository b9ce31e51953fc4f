//! Runner-owned session state.
//!
//! [`RunnerState`] is created when a runner starts and dropped when it stops.
//! It carries the generic part of a session (status, resource counters,
//! progress, cadence); each game keeps its entities and private bookkeeping in
//! its own [`crate::GameRules`] implementation.
mod common;
mod entity;
mod status;

use std::collections::BTreeMap;
use std::time::Duration;

pub use common::{ActorId, Position};
pub use entity::{Entity, EntityState};
pub use status::RunStatus;

use crate::config::Settings;
use crate::error::RulesError;

/// Tick and broadcast pacing of one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    /// Time between two simulation steps.
    pub tick_interval: Duration,
    /// Minimum time between two periodic state broadcasts.
    pub broadcast_interval: Duration,
}

impl Cadence {
    pub const DEFAULT_TICK_RATE_SECS: f64 = 0.1;
    pub const DEFAULT_FRAMES_PER_SECOND: f64 = 10.0;
    /// Broadcast interval used when `frames_per_second` is not positive.
    pub const FALLBACK_BROADCAST_INTERVAL: Duration = Duration::from_millis(100);

    pub const fn new(tick_interval: Duration, broadcast_interval: Duration) -> Self {
        Self {
            tick_interval,
            broadcast_interval,
        }
    }

    /// Builds a cadence from a tick rate in seconds and a broadcast frequency.
    pub fn from_rates(tick_rate_secs: f64, frames_per_second: f64) -> Result<Self, RulesError> {
        let tick_interval = Duration::try_from_secs_f64(tick_rate_secs)
            .ok()
            .filter(|interval| !interval.is_zero())
            .ok_or_else(|| {
                RulesError::invalid_setting(
                    "game_tick_rate",
                    format!("{tick_rate_secs} is not a positive number of seconds"),
                )
            })?;

        let broadcast_interval = if frames_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / frames_per_second).map_err(|_| {
                RulesError::invalid_setting(
                    "frames_per_second",
                    format!("{frames_per_second} cannot be turned into an interval"),
                )
            })?
        } else {
            Self::FALLBACK_BROADCAST_INTERVAL
        };

        Ok(Self::new(tick_interval, broadcast_interval))
    }

    /// Reads `game_tick_rate` (seconds) and `frames_per_second` from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, RulesError> {
        let tick_rate = settings.f64_or(&["game_tick_rate"], Self::DEFAULT_TICK_RATE_SECS)?;
        let fps = settings.f64_or(&["frames_per_second"], Self::DEFAULT_FRAMES_PER_SECOND)?;
        Self::from_rates(tick_rate, fps)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(100))
    }
}

/// Mutable state of one running session.
#[derive(Clone, Debug, PartialEq)]
pub struct RunnerState {
    pub status: RunStatus,
    /// Domain-defined counters such as lives, money or score.
    pub resources: BTreeMap<String, i64>,
    /// Progress indicator; wave-based games store the wave number here.
    pub progress: u32,
    pub time_remaining: Option<u32>,
    pub cadence: Cadence,
    /// Number of ticks started so far (the current tick included).
    pub ticks: u64,
}

impl RunnerState {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            status: RunStatus::Initializing,
            resources: BTreeMap::new(),
            progress: 0,
            time_remaining: None,
            cadence,
            ticks: 0,
        }
    }

    /// Current value of a resource counter; missing counters read as zero.
    pub fn resource(&self, key: &str) -> i64 {
        self.resources.get(key).copied().unwrap_or(0)
    }

    pub fn set_resource(&mut self, key: impl Into<String>, value: i64) {
        self.resources.insert(key.into(), value);
    }

    /// Adds `delta` to a counter and returns the new value.
    pub fn adjust_resource(&mut self, key: &str, delta: i64) -> i64 {
        let entry = self.resources.entry(key.to_owned()).or_insert(0);
        *entry = entry.saturating_add(delta);
        *entry
    }

    /// Debits `amount` only if the counter covers it.
    pub fn try_spend(&mut self, key: &str, amount: i64) -> bool {
        let available = self.resource(key);
        if amount < 0 || available < amount {
            return false;
        }
        self.resources.insert(key.to_owned(), available - amount);
        true
    }

    /// Moves to `next` if the lifecycle allows it.
    pub fn transition(&mut self, next: RunStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Records an outcome unless the session already has one.
    pub fn finish(&mut self, outcome: RunStatus) -> bool {
        debug_assert!(outcome.is_outcome(), "{outcome} is not an outcome");
        !self.status.is_outcome() && self.transition(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates_give_matching_tick_and_broadcast() {
        let cadence = Cadence::from_settings(&Settings::new()).unwrap();
        assert_eq!(cadence.tick_interval, Duration::from_millis(100));
        assert_eq!(cadence.broadcast_interval, Duration::from_millis(100));
    }

    #[test]
    fn one_frame_per_second_decouples_broadcasts() {
        let cadence = Cadence::from_rates(0.1, 1.0).unwrap();
        assert_eq!(cadence.tick_interval, Duration::from_millis(100));
        assert_eq!(cadence.broadcast_interval, Duration::from_secs(1));
    }

    #[test]
    fn non_positive_fps_falls_back() {
        let cadence = Cadence::from_rates(0.2, 0.0).unwrap();
        assert_eq!(
            cadence.broadcast_interval,
            Cadence::FALLBACK_BROADCAST_INTERVAL
        );
    }

    #[test]
    fn rejects_non_positive_tick_rate() {
        assert!(Cadence::from_rates(0.0, 10.0).is_err());
        assert!(Cadence::from_rates(-1.0, 10.0).is_err());
    }

    #[test]
    fn spending_requires_sufficient_funds() {
        let mut state = RunnerState::new(Cadence::default());
        state.set_resource("money", 40);

        assert!(!state.try_spend("money", 50));
        assert_eq!(state.resource("money"), 40);

        assert!(state.try_spend("money", 40));
        assert_eq!(state.resource("money"), 0);
    }

    #[test]
    fn first_outcome_sticks() {
        let mut state = RunnerState::new(Cadence::default());
        assert!(state.transition(RunStatus::Active));

        assert!(state.finish(RunStatus::Lost));
        assert!(!state.finish(RunStatus::Won));
        assert_eq!(state.status, RunStatus::Lost);

        assert!(!state.transition(RunStatus::Active));
        assert!(state.transition(RunStatus::Ended));
    }
}

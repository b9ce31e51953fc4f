//! The contract every concrete game implements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RulesError;
use crate::input::InputSnapshot;
use crate::state::{Entity, RunStatus, RunnerState};

/// Game logic driven by a session runner.
///
/// The runner calls [`GameRules::initialize`] once, then [`GameRules::tick`]
/// on every cadence step until the state carries an outcome or the session is
/// stopped. Implementations own their entities exclusively and mutate them
/// only from within these calls, so no synchronization is needed.
///
/// Setting an outcome is done through [`RunnerState::finish`]; returning an
/// error is equivalent to finishing with [`RunStatus::Error`].
pub trait GameRules: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Seeds resource counters and initial entities.
    fn initialize(&mut self, state: &mut RunnerState) -> Result<(), RulesError>;

    /// Advances the simulation by one tick using the drained input snapshot.
    fn tick(&mut self, state: &mut RunnerState, input: &InputSnapshot) -> Result<(), RulesError>;

    /// Renders the state for a `game_state` broadcast.
    fn summary(&self, state: &RunnerState) -> StateSummary {
        StateSummary::from_state(state)
    }

    /// Entity list for an `elems_update` broadcast, if one is due.
    ///
    /// Returning `None` skips the entity broadcast for this publish.
    fn entities(&mut self) -> Option<Vec<Entity>> {
        None
    }
}

/// Snapshot of the generic session state, without a timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub status: RunStatus,
    pub resources: BTreeMap<String, i64>,
    pub progress: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u32>,
}

impl StateSummary {
    pub fn from_state(state: &RunnerState) -> Self {
        Self {
            status: state.status,
            resources: state.resources.clone(),
            progress: state.progress,
            time_remaining: state.time_remaining,
        }
    }

    /// Same summary with a different status, used for the final broadcast.
    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = status;
        self
    }
}

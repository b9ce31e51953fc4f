//! Pending player input of one session.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use game_core::{ActorId, ActorInput, InputDelta, InputSnapshot};

/// Input received since the last tick, keyed by actor.
///
/// Producers merge deltas from any task; the runner drains a snapshot once
/// per tick. The lock is only held for a merge or a copy.
#[derive(Debug, Default)]
pub struct InputBuffer {
    pending: Mutex<HashMap<ActorId, ActorInput>>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, actor: ActorId, delta: InputDelta) {
        self.lock().entry(actor).or_default().merge(delta);
    }

    /// Copies every actor's input and clears one-shot values.
    ///
    /// Held keys stay pending; actors without any remaining input are dropped.
    pub fn drain(&self) -> InputSnapshot {
        let mut pending = self.lock();
        let snapshot = pending
            .iter_mut()
            .map(|(actor, input)| (*actor, input.take_one_shot()))
            .collect();
        pending.retain(|_, input| !input.is_empty());
        snapshot
    }

    /// Number of actors with pending input.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActorId, ActorInput>> {
        // Merges never leave the map half-updated, so a poisoned lock is still usable.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Buffered player input and its merge semantics.
//!
//! Producers send partial updates ([`InputDelta`]) that are merged into a
//! per-actor [`ActorInput`] until the runner drains them on its next tick.
//! Two kinds of input live side by side:
//!
//! - **Held keys** (`keys`) accumulate across deltas and survive draining until
//!   they are explicitly released through the reserved `key_up` entry.
//! - **Values** (every other key, e.g. `place_tower`) overwrite earlier values
//!   and are one-shot: draining hands them to the tick exactly once.
//!
//! Merging is idempotent for repeated identical deltas, and deltas from
//! different actors never interact.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::state::ActorId;

/// Key holding the currently pressed inputs of an actor.
pub const HELD_KEYS: &str = "keys";

/// Reserved key listing inputs that are no longer pressed.
pub const RELEASED_KEYS: &str = "key_up";

/// Partial input update as received from a producer.
pub type InputDelta = Map<String, Value>;

/// Inputs of all actors handed to one tick.
pub type InputSnapshot = BTreeMap<ActorId, ActorInput>;

/// Accumulated input of a single actor.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ActorInput {
    held: BTreeSet<String>,
    values: BTreeMap<String, Value>,
}

impl ActorInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a delta: pressed keys are added, released keys removed, and
    /// every other entry replaces the previous value under the same key.
    pub fn merge(&mut self, delta: InputDelta) {
        let mut released = None;

        for (key, value) in delta {
            match key.as_str() {
                HELD_KEYS => self.held.extend(key_list(&value)),
                RELEASED_KEYS => released = Some(value),
                _ => {
                    self.values.insert(key, value);
                }
            }
        }

        if let Some(released) = released {
            for key in key_list(&released) {
                self.held.remove(&key);
            }
        }
    }

    /// Copies the full input and clears the one-shot values, keeping held keys.
    pub fn take_one_shot(&mut self) -> ActorInput {
        ActorInput {
            held: self.held.clone(),
            values: std::mem::take(&mut self.values),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty() && self.values.is_empty()
    }

    pub fn held(&self) -> &BTreeSet<String> {
        &self.held
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Deserializes the value stored under `key`, if any.
    pub fn command<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T, serde_json::Error>> {
        self.values
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
    }
}

/// Accepts either a list of strings or a single string.
fn key_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(key) => vec![key.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

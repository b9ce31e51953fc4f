//! Outbound messages published for session viewers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use game_core::{Entity, RunStatus, StateSummary};

/// Message delivered to every viewer of a session group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Broadcast {
    /// Periodic session summary.
    GameState(GameStateUpdate),
    /// Current list of visible entities.
    ElemsUpdate(ElemsUpdate),
}

impl Broadcast {
    pub fn game_state(summary: StateSummary) -> Self {
        Self::GameState(GameStateUpdate::from_summary(summary, Utc::now()))
    }

    pub fn elems_update(items: Vec<Entity>) -> Self {
        Self::ElemsUpdate(ElemsUpdate {
            items,
            timestamp: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateUpdate {
    pub status: RunStatus,
    pub resources: BTreeMap<String, i64>,
    pub progress: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl GameStateUpdate {
    pub fn from_summary(summary: StateSummary, timestamp: DateTime<Utc>) -> Self {
        Self {
            status: summary.status,
            resources: summary.resources,
            progress: summary.progress,
            time_remaining: summary.time_remaining,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElemsUpdate {
    pub items: Vec<Entity>,
    pub timestamp: DateTime<Utc>,
}

/// A broadcast together with the group it was published to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub group: String,
    pub message: Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{Cadence, RunnerState};
    use serde_json::json;

    #[test]
    fn game_state_is_tagged_by_message_type() {
        let mut state = RunnerState::new(Cadence::default());
        state.set_resource("lives", 20);
        state.progress = 2;
        state.time_remaining = Some(12);

        let message = Broadcast::game_state(StateSummary::from_state(&state));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["message_type"], "game_state");
        assert_eq!(value["status"], "initializing");
        assert_eq!(value["resources"], json!({ "lives": 20 }));
        assert_eq!(value["progress"], 2);
        assert_eq!(value["time_remaining"], 12);
        assert!(value["timestamp"].is_string());

        let parsed: Broadcast = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn elems_update_carries_items() {
        let message = Broadcast::elems_update(vec![Entity::new(
            "enemy_1_0",
            "enemy",
            game_core::Position::new(1.0, 2.0),
        )]);
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["message_type"], "elems_update");
        assert_eq!(value["items"][0]["type"], "enemy");
    }
}

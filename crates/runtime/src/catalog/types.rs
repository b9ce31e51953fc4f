//! Session records as stored by the external catalog.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use game_core::Settings;

/// Unique identifier of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Name of the broadcast group viewers of this session subscribe to.
    pub fn group_name(&self) -> String {
        format!("game_{}", self.0)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalog identifier of a game type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameTypeId(pub u32);

impl GameTypeId {
    pub const TOWER_DEFENSE: Self = Self(1);
    pub const RESOURCE_MANAGEMENT: Self = Self(2);
    pub const PUZZLE: Self = Self(3);
}

impl fmt::Display for GameTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-type#{}", self.0)
    }
}

/// Persisted lifecycle status of a session.
///
/// ```text
/// pending -> ready -> starting -> ongoing -> { won | lost | error } -> ended
///                              \-> error
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Ready,
    Starting,
    Ongoing,
    Won,
    Lost,
    Ended,
    Error,
}

impl SessionStatus {
    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    ///
    /// Re-writing the current status is always allowed.
    pub const fn can_transition_to(self, next: Self) -> bool {
        use SessionStatus::*;

        if self as u8 == next as u8 {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Ready)
                | (Ready, Starting)
                | (Starting, Ongoing | Error)
                | (Ongoing, Won | Lost | Error | Ended)
                | (Won | Lost | Error, Ended)
        )
    }
}

/// A session the dispatcher may start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadySession {
    pub id: SessionId,
    pub game_type: GameTypeId,
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
}

impl ReadySession {
    pub fn new(game_type: GameTypeId, name: impl Into<String>, settings: Settings) -> Self {
        Self {
            id: SessionId::new(),
            game_type,
            name: name.into(),
            settings,
        }
    }
}

/// Full catalog record of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub game_type: GameTypeId,
    pub name: String,
    pub settings: Settings,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(game_type: GameTypeId, name: impl Into<String>, settings: Settings) -> Self {
        Self {
            id: SessionId::new(),
            game_type,
            name: name.into(),
            settings,
            status: SessionStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn to_ready(&self) -> ReadySession {
        ReadySession {
            id: self.id,
            game_type: self.game_type,
            name: self.name.clone(),
            settings: self.settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_monotonic() {
        use SessionStatus::*;

        let path = [Pending, Ready, Starting, Ongoing, Won, Ended];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
            assert!(!pair[1].can_transition_to(pair[0]), "{} -> {}", pair[1], pair[0]);
        }

        assert!(Starting.can_transition_to(Error));
        assert!(Ongoing.can_transition_to(Ended));
        assert!(Ended.can_transition_to(Ended));
        assert!(!Ready.can_transition_to(Ongoing));
        assert!(!Ended.can_transition_to(Ongoing));
    }

    #[test]
    fn group_name_uses_session_uuid() {
        let id = SessionId(Uuid::nil());
        assert_eq!(id.group_name(), "game_00000000-0000-0000-0000-000000000000");
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use super::common::{ActorId, Position};

/// Discrete state of an entity on the field.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityState {
    #[default]
    Active,
    Defeated,
    Escaped,
}

/// Broadcast view of a game entity.
///
/// Games keep their own typed entities and render them into this shape when
/// the runner publishes an entity list. Entities belong to exactly one
/// session and are never shared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Finer-grained kind within the type tag, e.g. the tower model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub position: Position,
    pub state: EntityState,
    pub properties: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ActorId>,
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            variant: None,
            position,
            state: EntityState::Active,
            properties: BTreeMap::new(),
            owner: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: f64) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_owner(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_type_tag_and_optional_owner() {
        let enemy = Entity::new("enemy_1_0", "enemy", Position::new(2.0, 60.0))
            .with_property("health", 60.0);

        let value = serde_json::to_value(&enemy).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "enemy_1_0",
                "type": "enemy",
                "position": { "x": 2.0, "y": 60.0 },
                "state": "active",
                "properties": { "health": 60.0 },
            })
        );

        let tower = Entity::new("tower_1", "tower", Position::ORIGIN)
            .with_variant("sniper")
            .with_owner(ActorId(7));
        let value = serde_json::to_value(&tower).unwrap();
        assert_eq!(value["owner"], json!(7));
        assert_eq!(value["variant"], json!("sniper"));
    }
}

//! Player commands carried as one-shot input values.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use game_core::{ActorId, ActorInput};

pub const PLACE_TOWER: &str = "place_tower";
pub const UPGRADE_TOWER: &str = "upgrade_tower";
pub const SELL_TOWER: &str = "sell_tower";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlaceTower {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpgradeTower {
    pub tower_id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SellTower {
    pub tower_id: String,
}

/// A single command or a batch sent within one input delta.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Commands issued by one actor during the last tick, in execution order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActorCommands {
    pub place: Vec<PlaceTower>,
    pub upgrade: Vec<UpgradeTower>,
    pub sell: Vec<SellTower>,
}

impl ActorCommands {
    /// Extracts commands from an actor's input; malformed entries are skipped.
    pub fn parse(actor: ActorId, input: &ActorInput) -> Self {
        Self {
            place: read(actor, input, PLACE_TOWER),
            upgrade: read(actor, input, UPGRADE_TOWER),
            sell: read(actor, input, SELL_TOWER),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.place.is_empty() && self.upgrade.is_empty() && self.sell.is_empty()
    }
}

fn read<T: DeserializeOwned>(actor: ActorId, input: &ActorInput, key: &str) -> Vec<T> {
    match input.command::<OneOrMany<T>>(key) {
        None => Vec::new(),
        Some(Ok(commands)) => commands.into(),
        Some(Err(error)) => {
            tracing::debug!(
                target: "game::tower_defense",
                %actor,
                command = key,
                %error,
                "ignoring malformed command"
            );
            Vec::new()
        }
    }
}

use game_core::{Entity, Position};
use rand::Rng;

use super::config::TowerDefenseConfig;

/// An enemy walking from the left edge of the field to the right.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: String,
    pub position: Position,
    pub health: f64,
    /// Distance covered per tick.
    pub speed: f64,
    /// Money and score credited when the enemy is defeated.
    pub value: i64,
}

impl Enemy {
    pub fn for_wave(wave: u32, index: u32, lane: f64, config: &TowerDefenseConfig) -> Self {
        let w = f64::from(wave);
        let scaling = config
            .difficulty_multiplier
            .powi(wave.saturating_sub(1) as i32);

        Self {
            id: format!("enemy_{wave}_{index}"),
            position: Position::new(0.0, lane),
            health: (50.0 + 10.0 * w) * scaling,
            speed: 2.0 + 0.2 * w,
            value: 10 + i64::from(wave),
        }
    }

    pub fn to_entity(&self) -> Entity {
        Entity::new(self.id.clone(), "enemy", self.position)
            .with_property("health", self.health)
            .with_property("speed", self.speed)
            .with_property("value", self.value as f64)
    }
}

/// Spawns every enemy of `wave` at `x = 0` on random lanes.
pub fn spawn_wave(wave: u32, config: &TowerDefenseConfig, rng: &mut impl Rng) -> Vec<Enemy> {
    (0..config.enemies_in_wave(wave))
        .map(|index| {
            let lane = rng.random_range(config.spawn_lanes()) as f64;
            Enemy::for_wave(wave, index, lane, config)
        })
        .collect()
}

/// Moves every enemy and removes those that crossed the right edge.
///
/// Returns how many escaped.
pub fn advance(enemies: &mut Vec<Enemy>, field_width: f64) -> u32 {
    let before = enemies.len();
    enemies.retain_mut(|enemy| {
        enemy.position.x += enemy.speed;
        enemy.position.x <= field_width
    });
    (before - enemies.len()) as u32
}

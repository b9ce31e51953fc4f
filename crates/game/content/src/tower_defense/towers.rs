use game_core::{ActorId, Entity, Position};

use super::enemies::Enemy;
use crate::loaders::TowerKindSpec;

/// A placed tower.
#[derive(Clone, Debug, PartialEq)]
pub struct Tower {
    pub id: String,
    pub kind: String,
    pub owner: ActorId,
    pub position: Position,
    /// Starts at 1 and grows by one per upgrade.
    pub level: u32,
    pub damage: f64,
    pub range: f64,
    pub shots_per_tick: u32,
    /// Money spent on placement and upgrades, the base of sell refunds.
    pub invested: i64,
}

impl Tower {
    pub fn place(id: String, spec: &TowerKindSpec, owner: ActorId, position: Position) -> Self {
        Self {
            id,
            kind: spec.name.clone(),
            owner,
            position,
            level: 1,
            damage: spec.damage,
            range: spec.range,
            shots_per_tick: spec.shots_per_tick,
            invested: spec.cost,
        }
    }

    pub fn upgrade(&mut self, spec: &TowerKindSpec, cost: i64) {
        self.level += 1;
        self.damage *= spec.upgrade_damage_factor;
        self.range *= spec.upgrade_range_factor;
        self.invested = self.invested.saturating_add(cost);
    }

    /// Index of the nearest enemy within range.
    ///
    /// Distance ties keep the enemy found first.
    pub fn find_target(&self, enemies: &[Enemy]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, enemy) in enemies.iter().enumerate() {
            let distance = self.position.distance(&enemy.position);
            if distance > self.range {
                continue;
            }
            if best.is_none_or(|(_, closest)| distance < closest) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    pub fn to_entity(&self) -> Entity {
        Entity::new(self.id.clone(), "tower", self.position)
            .with_variant(self.kind.clone())
            .with_owner(self.owner)
            .with_property("level", f64::from(self.level))
            .with_property("damage", self.damage)
            .with_property("range", self.range)
    }
}

/// Runs every tower's attacks, removing defeated enemies.
///
/// Returns the summed reward of the defeated enemies.
pub fn resolve_attacks(towers: &[Tower], enemies: &mut Vec<Enemy>) -> i64 {
    let mut reward = 0;
    for tower in towers {
        for _ in 0..tower.shots_per_tick {
            let Some(index) = tower.find_target(enemies) else {
                break;
            };
            let target = &mut enemies[index];
            target.health -= tower.damage;
            if target.health <= 0.0 {
                reward += enemies.remove(index).value;
            }
        }
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tower_defense::TowerDefenseConfig;

    fn spec() -> TowerKindSpec {
        TowerKindSpec {
            name: "basic".into(),
            cost: 50,
            damage: 10.0,
            range: 100.0,
            shots_per_tick: 1,
            upgrade_damage_factor: 1.5,
            upgrade_range_factor: 1.1,
        }
    }

    fn enemy_at(index: u32, x: f64, y: f64) -> Enemy {
        let mut enemy = Enemy::for_wave(1, index, y, &TowerDefenseConfig::default());
        enemy.position.x = x;
        enemy
    }

    #[test]
    fn targets_nearest_enemy_in_range() {
        let tower = Tower::place("tower_1".into(), &spec(), ActorId(1), Position::new(100.0, 100.0));
        let enemies = [
            enemy_at(0, 100.0, 190.0),
            enemy_at(1, 100.0, 150.0),
            enemy_at(2, 100.0, 101.0 + 200.0),
        ];
        assert_eq!(tower.find_target(&enemies), Some(1));
    }

    #[test]
    fn range_boundary_is_inclusive_and_ties_keep_first() {
        let tower = Tower::place("tower_1".into(), &spec(), ActorId(1), Position::new(0.0, 100.0));
        let enemies = [enemy_at(0, 100.0, 100.0), enemy_at(1, 100.0, 100.0)];
        assert_eq!(tower.find_target(&enemies), Some(0));

        let out_of_range = [enemy_at(0, 100.5, 100.0)];
        assert_eq!(tower.find_target(&out_of_range), None);
    }

    #[test]
    fn defeated_enemies_pay_out_and_disappear() {
        let tower = Tower::place("tower_1".into(), &spec(), ActorId(1), Position::new(0.0, 100.0));
        let mut enemies = vec![enemy_at(0, 10.0, 100.0)];
        enemies[0].health = 10.0;

        assert_eq!(resolve_attacks(&[tower], &mut enemies), 11);
        assert!(enemies.is_empty());
    }

    #[test]
    fn upgrades_scale_stats_and_investment() {
        let spec = spec();
        let mut tower = Tower::place("tower_1".into(), &spec, ActorId(1), Position::ORIGIN);
        tower.upgrade(&spec, spec.upgrade_cost(tower.level));

        assert_eq!(tower.level, 2);
        assert_eq!(tower.damage, 15.0);
        assert!((tower.range - 110.0).abs() < 1e-9);
        assert_eq!(tower.invested, 100);
    }
}

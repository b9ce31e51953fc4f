//! Wave-based tower defense.
//!
//! Enemies spawn in waves at the left edge and walk right; each one that
//! crosses the right edge costs a life. Players spend money on towers that
//! shoot the nearest enemy in range and earn money and score for every kill.
//! The session is won once the last wave is cleared and lost when lives run
//! out.
//!
//! Each tick runs, in order: player commands, the wave timer, enemy movement,
//! tower attacks, the progress update and the win/loss check.
mod commands;
mod config;
mod enemies;
mod towers;

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use game_core::{
    ActorId, Entity, GameRules, InputSnapshot, Position, RulesError, RunStatus, RunnerState,
    Settings,
};

pub use commands::{ActorCommands, PlaceTower, SellTower, UpgradeTower};
pub use config::TowerDefenseConfig;
pub use enemies::Enemy;
pub use towers::Tower;

use crate::loaders::{TowerCatalog, TowerKindSpec, TowerLoader};

pub const LIVES: &str = "lives";
pub const MONEY: &str = "money";
pub const SCORE: &str = "score";

const TARGET: &str = "game::tower_defense";

/// Tower defense rules for one session.
pub struct TowerDefense {
    config: TowerDefenseConfig,
    catalog: Arc<TowerCatalog>,
    default_kind: String,
    rng: StdRng,
    towers: Vec<Tower>,
    enemies: Vec<Enemy>,
    wave_timer: Duration,
    next_tower: u64,
    /// Set whenever the entity list differs from the last one handed out.
    dirty: bool,
}

impl TowerDefense {
    pub const NAME: &'static str = "tower_defense";

    /// Builds a session from its settings using the embedded tower catalog.
    pub fn from_settings(settings: &Settings) -> Result<Self, RulesError> {
        let catalog = TowerLoader::embedded().map_err(|e| RulesError::Content(e.to_string()))?;
        Self::new(settings, Arc::new(catalog))
    }

    pub fn new(settings: &Settings, catalog: Arc<TowerCatalog>) -> Result<Self, RulesError> {
        let config = TowerDefenseConfig::from_settings(settings)?;

        let default_kind = config
            .default_tower_kind
            .clone()
            .unwrap_or_else(|| catalog.default_kind.clone());
        if catalog.get(&default_kind).is_none() {
            return Err(RulesError::UnknownTowerKind(default_kind));
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        tracing::debug!(target: TARGET, seed, "seeding spawn lanes");

        Ok(Self {
            config,
            catalog,
            default_kind,
            rng: StdRng::seed_from_u64(seed),
            towers: Vec::new(),
            enemies: Vec::new(),
            wave_timer: Duration::ZERO,
            next_tower: 1,
            dirty: false,
        })
    }

    pub fn config(&self) -> &TowerDefenseConfig {
        &self.config
    }

    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    fn apply_commands(&mut self, state: &mut RunnerState, input: &InputSnapshot) {
        for (&actor, actor_input) in input {
            let commands = ActorCommands::parse(actor, actor_input);
            if commands.is_empty() {
                continue;
            }
            for place in commands.place {
                self.place_tower(state, actor, place);
            }
            for upgrade in commands.upgrade {
                self.upgrade_tower(state, actor, upgrade);
            }
            for sell in commands.sell {
                self.sell_tower(state, actor, sell);
            }
        }
    }

    fn place_tower(&mut self, state: &mut RunnerState, actor: ActorId, command: PlaceTower) {
        let kind = command.kind.as_deref().unwrap_or(&self.default_kind);
        let Some(spec) = self.catalog.get(kind) else {
            tracing::debug!(target: TARGET, %actor, kind, "refusing unknown tower kind");
            return;
        };
        if !self.config.contains(command.x, command.y) {
            tracing::debug!(target: TARGET, %actor, x = command.x, y = command.y, "refusing placement outside the field");
            return;
        }
        if !state.try_spend(MONEY, spec.cost) {
            tracing::debug!(target: TARGET, %actor, cost = spec.cost, "refusing unaffordable tower");
            return;
        }

        let id = format!("tower_{}", self.next_tower);
        self.next_tower += 1;
        tracing::debug!(target: TARGET, %actor, tower = %id, kind, "tower placed");
        self.towers.push(Tower::place(
            id,
            spec,
            actor,
            Position::new(command.x, command.y),
        ));
        self.dirty = true;
    }

    fn upgrade_tower(&mut self, state: &mut RunnerState, actor: ActorId, command: UpgradeTower) {
        let Some(tower) = owned_tower(&mut self.towers, actor, &command.tower_id) else {
            return;
        };
        if tower.level > self.config.max_tower_upgrades {
            tracing::debug!(target: TARGET, %actor, tower = %tower.id, "tower is fully upgraded");
            return;
        }
        let Some(spec) = self.catalog.get(&tower.kind) else {
            return;
        };
        let cost = spec.upgrade_cost(tower.level);
        if !state.try_spend(MONEY, cost) {
            tracing::debug!(target: TARGET, %actor, tower = %tower.id, cost, "refusing unaffordable upgrade");
            return;
        }

        tower.upgrade(spec, cost);
        self.dirty = true;
    }

    fn sell_tower(&mut self, state: &mut RunnerState, actor: ActorId, command: SellTower) {
        let Some(index) = self
            .towers
            .iter()
            .position(|tower| tower.id == command.tower_id && tower.owner == actor)
        else {
            tracing::debug!(target: TARGET, %actor, tower = %command.tower_id, "no such tower owned by actor");
            return;
        };

        let tower = self.towers.remove(index);
        let refund = (tower.invested as f64 * self.config.sell_refund_ratio).floor() as i64;
        state.adjust_resource(MONEY, refund);
        self.dirty = true;
    }

    fn advance_wave_timer(&mut self, state: &mut RunnerState) {
        self.wave_timer += state.cadence.tick_interval;
        if self.wave_timer >= self.config.wave_interval {
            self.wave_timer = Duration::ZERO;
            self.start_wave(state);
        }
    }

    fn start_wave(&mut self, state: &mut RunnerState) {
        state.progress += 1;
        let wave = state.progress;

        if wave > self.config.max_waves {
            tracing::info!(target: TARGET, wave, "all waves survived");
            state.finish(RunStatus::Won);
            return;
        }

        let spawned = enemies::spawn_wave(wave, &self.config, &mut self.rng);
        tracing::debug!(target: TARGET, wave, enemies = spawned.len(), "wave started");
        self.enemies.extend(spawned);
        self.dirty = true;
    }

    fn update_time_remaining(&self, state: &mut RunnerState) {
        let remaining = self.config.wave_interval.saturating_sub(self.wave_timer);
        state.time_remaining = Some(remaining.as_secs_f64().ceil() as u32);
    }

    fn evaluate_outcome(&self, state: &mut RunnerState) {
        if state.resource(LIVES) <= 0 {
            state.finish(RunStatus::Lost);
        } else if state.progress >= self.config.max_waves && self.enemies.is_empty() {
            state.finish(RunStatus::Won);
        }
    }

    fn kind_spec(&self, name: &str) -> Option<&TowerKindSpec> {
        self.catalog.get(name)
    }
}

fn owned_tower<'a>(towers: &'a mut [Tower], actor: ActorId, id: &str) -> Option<&'a mut Tower> {
    let tower = towers
        .iter_mut()
        .find(|tower| tower.id == id && tower.owner == actor);
    if tower.is_none() {
        tracing::debug!(target: TARGET, %actor, tower = id, "no such tower owned by actor");
    }
    tower
}

impl GameRules for TowerDefense {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, state: &mut RunnerState) -> Result<(), RulesError> {
        if self.kind_spec(&self.default_kind).is_none() {
            return Err(RulesError::UnknownTowerKind(self.default_kind.clone()));
        }

        state.set_resource(LIVES, self.config.starting_lives);
        state.set_resource(MONEY, self.config.starting_money);
        state.set_resource(SCORE, 0);
        state.progress = 0;
        self.update_time_remaining(state);
        self.dirty = true;
        Ok(())
    }

    fn tick(&mut self, state: &mut RunnerState, input: &InputSnapshot) -> Result<(), RulesError> {
        self.apply_commands(state, input);
        self.advance_wave_timer(state);

        if !self.enemies.is_empty() {
            let escaped = enemies::advance(&mut self.enemies, self.config.field_width);
            if escaped > 0 {
                state.adjust_resource(LIVES, -i64::from(escaped));
            }
            self.dirty = true;
        }

        let reward = towers::resolve_attacks(&self.towers, &mut self.enemies);
        if reward > 0 {
            state.adjust_resource(MONEY, reward);
            state.adjust_resource(SCORE, reward);
        }

        self.update_time_remaining(state);
        self.evaluate_outcome(state);
        Ok(())
    }

    fn entities(&mut self) -> Option<Vec<Entity>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        Some(
            self.towers
                .iter()
                .map(Tower::to_entity)
                .chain(self.enemies.iter().map(Enemy::to_entity))
                .collect(),
        )
    }
}

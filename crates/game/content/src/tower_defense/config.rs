use std::ops::RangeInclusive;
use std::time::Duration;

use game_core::{RulesError, Settings};

/// Distance kept between spawn lanes and the top/bottom field edges.
const LANE_MARGIN: f64 = 50.0;

/// Tower defense parameters read from the session settings.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerDefenseConfig {
    pub starting_lives: i64,
    pub starting_money: i64,
    pub wave_interval: Duration,
    pub max_waves: u32,
    pub enemies_base: u32,
    pub enemies_per_wave: u32,
    /// Extra health scaling applied once per wave after the first.
    pub difficulty_multiplier: f64,
    pub field_width: f64,
    pub field_height: f64,
    pub max_tower_upgrades: u32,
    pub sell_refund_ratio: f64,
    /// Overrides the catalog's default tower kind.
    pub default_tower_kind: Option<String>,
    pub seed: Option<u64>,
}

impl Default for TowerDefenseConfig {
    fn default() -> Self {
        Self {
            starting_lives: 20,
            starting_money: 100,
            wave_interval: Duration::from_secs(30),
            max_waves: 10,
            enemies_base: 5,
            enemies_per_wave: 2,
            difficulty_multiplier: 1.0,
            field_width: 800.0,
            field_height: 500.0,
            max_tower_upgrades: 3,
            sell_refund_ratio: 0.5,
            default_tower_kind: None,
            seed: None,
        }
    }
}

impl TowerDefenseConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, RulesError> {
        let defaults = Self::default();

        let wave_interval_secs = settings.f64_or(
            &["wave_interval"],
            defaults.wave_interval.as_secs_f64(),
        )?;
        let wave_interval = Duration::try_from_secs_f64(wave_interval_secs)
            .ok()
            .filter(|interval| !interval.is_zero())
            .ok_or_else(|| {
                RulesError::invalid_setting("wave_interval", "must be a positive number of seconds")
            })?;

        let default_tower_kind = match settings.get("default_tower_kind") {
            None => None,
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| {
                        RulesError::invalid_setting("default_tower_kind", "expected a string")
                    })?
                    .to_owned(),
            ),
        };

        let config = Self {
            starting_lives: settings
                .i64_or(&["starting_lives", "initial_lives"], defaults.starting_lives)?,
            starting_money: settings
                .i64_or(&["starting_money", "initial_money"], defaults.starting_money)?,
            wave_interval,
            max_waves: settings.u32_or(&["max_waves"], defaults.max_waves)?,
            enemies_base: settings.u32_or(&["enemies_base"], defaults.enemies_base)?,
            enemies_per_wave: settings.u32_or(&["enemies_per_wave"], defaults.enemies_per_wave)?,
            difficulty_multiplier: settings.f64_or(
                &["per_wave_difficulty_multiplier"],
                defaults.difficulty_multiplier,
            )?,
            field_width: settings.f64_or(&["field_width"], defaults.field_width)?,
            field_height: settings.f64_or(&["field_height"], defaults.field_height)?,
            max_tower_upgrades: settings
                .u32_or(&["max_tower_upgrades"], defaults.max_tower_upgrades)?,
            sell_refund_ratio: settings
                .f64_or(&["sell_refund_ratio"], defaults.sell_refund_ratio)?,
            default_tower_kind,
            seed: settings.u64_opt(&["seed"])?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), RulesError> {
        if self.starting_lives <= 0 {
            return Err(RulesError::invalid_setting("starting_lives", "must be at least 1"));
        }
        if self.starting_money < 0 {
            return Err(RulesError::invalid_setting("starting_money", "must not be negative"));
        }
        if self.max_waves == 0 {
            return Err(RulesError::invalid_setting("max_waves", "must be at least 1"));
        }
        if self.difficulty_multiplier < 1.0 {
            return Err(RulesError::invalid_setting(
                "per_wave_difficulty_multiplier",
                "must be at least 1",
            ));
        }
        if self.field_width <= 0.0 || self.field_height <= 0.0 {
            return Err(RulesError::invalid_setting("field_width", "field must have a positive size"));
        }
        if !(0.0..=1.0).contains(&self.sell_refund_ratio) {
            return Err(RulesError::invalid_setting("sell_refund_ratio", "must be within 0..=1"));
        }
        Ok(())
    }

    /// Number of enemies spawned by wave `wave`.
    pub fn enemies_in_wave(&self, wave: u32) -> u32 {
        self.enemies_base
            .saturating_add(self.enemies_per_wave.saturating_mul(wave))
    }

    /// Vertical band enemies spawn in; collapses to the middle on small fields.
    pub fn spawn_lanes(&self) -> RangeInclusive<i64> {
        let top = LANE_MARGIN as i64;
        let bottom = (self.field_height - LANE_MARGIN) as i64;
        if bottom >= top {
            top..=bottom
        } else {
            let middle = (self.field_height / 2.0) as i64;
            middle..=middle
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.field_width).contains(&x) && (0.0..=self.field_height).contains(&y)
    }
}

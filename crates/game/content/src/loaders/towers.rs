//! Tower catalog loader.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

const EMBEDDED_TOWERS: &str = include_str!("../../data/towers.ron");

/// Stats of one tower kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerKindSpec {
    pub name: String,
    /// Placement cost; also the base of every upgrade cost.
    pub cost: i64,
    pub damage: f64,
    pub range: f64,
    /// Number of attacks per tick.
    #[serde(default = "default_shots")]
    pub shots_per_tick: u32,
    pub upgrade_damage_factor: f64,
    pub upgrade_range_factor: f64,
}

fn default_shots() -> u32 {
    1
}

impl TowerKindSpec {
    /// Cost of upgrading a tower currently at `level`.
    pub fn upgrade_cost(&self, level: u32) -> i64 {
        self.cost.saturating_mul(i64::from(level))
    }
}

/// Tower catalog structure for RON files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerCatalog {
    /// Kind used when a placement command names none.
    pub default_kind: String,
    pub kinds: Vec<TowerKindSpec>,
}

impl TowerCatalog {
    pub fn get(&self, name: &str) -> Option<&TowerKindSpec> {
        self.kinds.iter().find(|kind| kind.name == name)
    }

    pub fn default_kind(&self) -> Option<&TowerKindSpec> {
        self.get(&self.default_kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(|kind| kind.name.as_str())
    }

    fn validate(&self) -> LoadResult<()> {
        let mut seen = HashSet::new();
        for kind in &self.kinds {
            if !seen.insert(kind.name.as_str()) {
                anyhow::bail!("Duplicate tower kind `{}`", kind.name);
            }
            if kind.cost <= 0 {
                anyhow::bail!("Tower kind `{}` must have a positive cost", kind.name);
            }
            if !(kind.damage > 0.0 && kind.range > 0.0) {
                anyhow::bail!("Tower kind `{}` needs positive damage and range", kind.name);
            }
            if kind.shots_per_tick == 0 {
                anyhow::bail!("Tower kind `{}` never fires", kind.name);
            }
            if kind.upgrade_damage_factor < 1.0 || kind.upgrade_range_factor < 1.0 {
                anyhow::bail!("Tower kind `{}` has an upgrade factor below 1", kind.name);
            }
        }

        if self.default_kind().is_none() {
            anyhow::bail!("Default tower kind `{}` is not in the catalog", self.default_kind);
        }
        Ok(())
    }
}

/// Loader for tower catalogs from RON files.
pub struct TowerLoader;

impl TowerLoader {
    /// Load and validate a tower catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<TowerCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a tower catalog from RON text.
    pub fn parse(content: &str) -> LoadResult<TowerCatalog> {
        let catalog: TowerCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse tower catalog RON: {}", e))?;
        catalog.validate()?;

        Ok(catalog)
    }

    /// The catalog shipped with this crate.
    pub fn embedded() -> LoadResult<TowerCatalog> {
        Self::parse(EMBEDDED_TOWERS)
    }
}

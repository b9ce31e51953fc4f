//! Concrete games and the data files they are built from.
//!
//! - [`tower_defense`]: wave-based tower defense implementing
//!   [`game_core::GameRules`]
//! - [`loaders`]: RON loaders for content catalogs (tower kinds)
//!
//! Content is read once when a session is built and never appears in the
//! runner state itself.

pub mod loaders;
pub mod tower_defense;

pub use loaders::{LoadResult, TowerCatalog, TowerKindSpec, TowerLoader};
pub use tower_defense::{TowerDefense, TowerDefenseConfig};

//! Content loaders for reading game data from files.
//!
//! Loaders turn RON files into the catalogs consumed by the games in this
//! crate. Each catalog also ships an embedded default so that a session can be
//! built without touching the filesystem.

pub mod towers;

pub use towers::{TowerCatalog, TowerKindSpec, TowerLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

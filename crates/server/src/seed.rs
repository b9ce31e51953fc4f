//! Seeds the in-memory catalog from a TOML file for local runs.
//!
//! ```toml
//! [[sessions]]
//! name = "defend the gate"
//! game_type = 1
//!
//! [sessions.settings]
//! max_waves = 3
//! wave_interval = 10.0
//! ```

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use game_core::Settings;
use runtime::{GameTypeId, InMemoryCatalog, SessionId, SessionRecord, SessionStatus};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    sessions: Vec<SeedSession>,
}

#[derive(Debug, Deserialize)]
struct SeedSession {
    name: String,
    game_type: u32,
    #[serde(default = "ready")]
    status: SessionStatus,
    #[serde(default)]
    settings: Settings,
}

fn ready() -> SessionStatus {
    SessionStatus::Ready
}

/// Parses seed sessions from TOML text.
pub fn parse(content: &str) -> Result<Vec<SessionRecord>> {
    let file: SeedFile =
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse seed TOML: {}", e))?;

    Ok(file
        .sessions
        .into_iter()
        .map(|session| {
            SessionRecord::new(GameTypeId(session.game_type), session.name, session.settings)
                .with_status(session.status)
        })
        .collect())
}

/// Loads `path` into `catalog`, returning the ids of the inserted sessions.
pub fn load(path: &Path, catalog: &InMemoryCatalog) -> Result<Vec<SessionId>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

    parse(&content)?
        .into_iter()
        .map(|record| catalog.insert(record).map_err(anyhow::Error::from))
        .collect()
}

//! Game engine server binary.
//!
//! Composition root that assembles the session catalog, the engine and the
//! logging stack, then runs until interrupted.
//!
//! # Environment
//!
//! - `SERVER_SEED_FILE`: TOML file of sessions loaded into the in-memory catalog
//! - `SERVER_LOG_DIR`: overrides the platform log directory
//! - `RUST_LOG`: tracing filter (default `info`)
//! - `ENGINE_*`: see [`runtime::EngineConfig::from_env`]
//!
//! ```bash
//! SERVER_SEED_FILE=crates/server/sessions.toml cargo run -p game-server
//! ```

mod logging;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use runtime::{Broadcast, Engine, EngineConfig, InMemoryCatalog};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_dir = std::env::var_os("SERVER_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(logging::default_log_dir);
    let _guard = logging::setup_logging(&log_dir)?;

    let config = EngineConfig::from_env();
    tracing::info!(?config, "Starting game engine");

    let catalog = Arc::new(InMemoryCatalog::new());
    if let Some(path) = std::env::var_os("SERVER_SEED_FILE").map(PathBuf::from) {
        let ids = seed::load(&path, &catalog)?;
        tracing::info!(sessions = ids.len(), file = %path.display(), "Catalog seeded");
    } else {
        tracing::warn!("SERVER_SEED_FILE not set; catalog starts empty");
    }

    let engine = Engine::builder()
        .config(config)
        .catalog_arc(catalog)
        .build()?;

    let firehose = tokio::spawn(log_broadcasts(engine.handle().subscribe_all()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");

    engine.shutdown().await?;
    firehose.abort();

    Ok(())
}

/// Logs every broadcast at debug level.
async fn log_broadcasts(mut rx: tokio::sync::broadcast::Receiver<runtime::Envelope>) {
    loop {
        match rx.recv().await {
            Ok(envelope) => match &envelope.message {
                Broadcast::GameState(update) => tracing::debug!(
                    target: "server::broadcast",
                    group = %envelope.group,
                    status = %update.status,
                    progress = update.progress,
                    resources = ?update.resources,
                    "game_state"
                ),
                Broadcast::ElemsUpdate(update) => tracing::trace!(
                    target: "server::broadcast",
                    group = %envelope.group,
                    items = update.items.len(),
                    "elems_update"
                ),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(target: "server::broadcast", skipped, "broadcast log lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

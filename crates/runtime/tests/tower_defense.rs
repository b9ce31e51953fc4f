//! Tower defense sessions driven end to end through the engine.
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::wait_for_status;
use game_core::{ActorId, RunStatus, Settings};
use runtime::{
    Broadcast, Engine, EngineConfig, GameTypeId, InMemoryCatalog, SessionId, SessionStatus,
};
use serde_json::json;
use tokio::sync::broadcast;

fn engine(catalog: &Arc<InMemoryCatalog>) -> Engine {
    Engine::builder()
        .config(EngineConfig {
            poll_interval: Duration::from_millis(500),
            ..EngineConfig::default()
        })
        .catalog_arc(catalog.clone())
        .build()
        .expect("engine should build")
}

fn single_wave() -> Settings {
    Settings::new()
        .with("game_tick_rate", 0.1)
        .with("frames_per_second", 10)
        .with("max_waves", 1)
        .with("wave_interval", 1.0)
        .with("enemies_base", 1)
        .with("enemies_per_wave", 0)
        .with("starting_money", 50)
        .with("field_height", 60)
        .with("seed", 7)
}

/// Every message up to and including the final `game_state`.
async fn drain_session(rx: &mut broadcast::Receiver<Broadcast>) -> Vec<Broadcast> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.recv().await {
        let last = matches!(&message, Broadcast::GameState(update) if update.status.is_terminal());
        messages.push(message);
        if last {
            break;
        }
    }
    messages
}

fn final_state(messages: &[Broadcast]) -> &runtime::GameStateUpdate {
    messages
        .iter()
        .rev()
        .find_map(|message| match message {
            Broadcast::GameState(update) => Some(update),
            Broadcast::ElemsUpdate(_) => None,
        })
        .expect("at least one game_state")
}

#[tokio::test(start_paused = true)]
async fn a_placed_tower_clears_the_only_wave() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let id: SessionId = catalog
        .create_ready(GameTypeId::TOWER_DEFENSE, "defend", single_wave())
        .unwrap();

    let engine = engine(&catalog);
    let handle = engine.handle();
    let mut rx = handle.subscribe(id);

    wait_for_status(&catalog, id, SessionStatus::Ongoing).await;
    let place = json!({ "place_tower": { "x": 20, "y": 30 } });
    handle
        .submit_input(id, ActorId(1), place.as_object().cloned().unwrap())
        .await
        .unwrap();

    let messages = drain_session(&mut rx).await;
    let last = final_state(&messages);
    assert_eq!(last.status, RunStatus::Won);
    assert_eq!(last.progress, 1);
    assert_eq!(last.resources["score"], 11);
    assert_eq!(last.resources["money"], 11);
    assert_eq!(last.resources["lives"], 20);

    let tower = messages
        .iter()
        .filter_map(|message| match message {
            Broadcast::ElemsUpdate(update) => Some(update),
            Broadcast::GameState(_) => None,
        })
        .flat_map(|update| update.items.iter())
        .find(|entity| entity.kind == "tower")
        .expect("tower entity broadcast");
    assert_eq!(tower.variant.as_deref(), Some("basic"));
    assert_eq!(tower.owner, Some(ActorId(1)));

    wait_for_status(&catalog, id, SessionStatus::Ended).await;
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn leaking_a_whole_wave_loses() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let settings = Settings::new()
        .with("starting_lives", 7)
        .with("wave_interval", 0.1)
        .with("field_width", 1)
        .with("seed", 1);
    let id = catalog
        .create_ready(GameTypeId::TOWER_DEFENSE, "doomed", settings)
        .unwrap();

    let engine = engine(&catalog);
    let mut rx = engine.subscribe(id);

    let messages = drain_session(&mut rx).await;
    let last = final_state(&messages);
    assert_eq!(last.status, RunStatus::Lost);
    assert!(last.resources["lives"] <= 0);

    wait_for_status(&catalog, id, SessionStatus::Ended).await;
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn input_for_unknown_sessions_is_dropped() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let engine = engine(&catalog);

    let delta = json!({ "keys": ["space"] }).as_object().cloned().unwrap();
    engine
        .handle()
        .submit_input(SessionId::new(), ActorId(1), delta)
        .await
        .unwrap();
    assert!(engine.handle().active_sessions().await.unwrap().is_empty());

    engine.shutdown().await.unwrap();
}

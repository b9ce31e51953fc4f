//! Dispatcher behavior observed through the engine API and the catalog.
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{SCRIPTED, collect_until_final, fast_settings, registry, wait_for_status};
use game_core::RunStatus;
use runtime::{
    Engine, EngineConfig, EngineError, GameTypeId, InMemoryCatalog, SessionRecord, SessionStatus,
};

fn engine(catalog: &Arc<InMemoryCatalog>) -> Engine {
    let config = EngineConfig {
        poll_interval: Duration::from_secs(1),
        ..EngineConfig::default()
    };
    Engine::builder()
        .config(config)
        .catalog_arc(catalog.clone())
        .registry(registry())
        .build()
        .expect("engine should build")
}

#[tokio::test(start_paused = true)]
async fn ready_sessions_are_picked_up_and_released() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let id = catalog
        .create_ready(SCRIPTED, "short", fast_settings().with("finish_at", 5))
        .unwrap();

    let engine = engine(&catalog);
    let mut rx = engine.subscribe(id);

    let updates = collect_until_final(&mut rx).await;
    assert_eq!(updates.last().map(|u| u.status), Some(RunStatus::Won));
    wait_for_status(&catalog, id, SessionStatus::Ended).await;

    assert_eq!(
        catalog.history(id).unwrap(),
        vec![
            SessionStatus::Pending,
            SessionStatus::Ready,
            SessionStatus::Starting,
            SessionStatus::Ongoing,
            SessionStatus::Ended,
        ]
    );

    // The next poll cycle reaps the finished runner.
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert!(engine.handle().active_sessions().await.unwrap().is_empty());

    engine.shutdown().await.unwrap();
}

/// Rules that panic while rendering still end their session and give up
/// their claim.
#[tokio::test(start_paused = true)]
async fn sessions_whose_rendering_panics_are_ended_and_released() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let id = catalog
        .create_ready(SCRIPTED, "broken", fast_settings().with("panic_in_entities", true))
        .unwrap();

    let engine = engine(&catalog);
    let mut rx = engine.subscribe(id);

    let updates = collect_until_final(&mut rx).await;
    assert_eq!(updates.last().map(|u| u.status), Some(RunStatus::Error));
    wait_for_status(&catalog, id, SessionStatus::Ended).await;

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert!(engine.handle().active_sessions().await.unwrap().is_empty());
    assert_eq!(catalog.history(id).unwrap().last(), Some(&SessionStatus::Ended));

    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unknown_game_types_are_marked_error_and_not_retried() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let id = catalog
        .create_ready(GameTypeId::PUZZLE, "puzzle", fast_settings())
        .unwrap();

    let engine = engine(&catalog);
    wait_for_status(&catalog, id, SessionStatus::Error).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        catalog.history(id).unwrap(),
        vec![
            SessionStatus::Pending,
            SessionStatus::Ready,
            SessionStatus::Starting,
            SessionStatus::Error,
        ]
    );
    assert!(engine.handle().active_sessions().await.unwrap().is_empty());

    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn invalid_settings_are_marked_error() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let id = catalog
        .create_ready(
            GameTypeId::TOWER_DEFENSE,
            "broken",
            fast_settings().with("game_tick_rate", 0),
        )
        .unwrap();

    let engine = engine(&catalog);
    wait_for_status(&catalog, id, SessionStatus::Error).await;

    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn a_session_is_claimed_at_most_once() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let record = SessionRecord::new(SCRIPTED, "dup", fast_settings())
        .with_status(SessionStatus::Ready);
    let session = record.to_ready();
    catalog.insert(record).unwrap();

    let engine = engine(&catalog);
    let handle = engine.handle();
    handle.start_session(session.clone()).await.unwrap();
    handle.start_session(session.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert_eq!(handle.active_sessions().await.unwrap(), vec![session.id]);
    let starts = catalog
        .history(session.id)
        .unwrap()
        .into_iter()
        .filter(|status| *status == SessionStatus::Starting)
        .count();
    assert_eq!(starts, 1);

    engine.shutdown().await.unwrap();
    assert_eq!(catalog.status(session.id).unwrap(), SessionStatus::Ended);
}

#[tokio::test(start_paused = true)]
async fn catalog_outages_only_delay_discovery() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let id = catalog
        .create_ready(SCRIPTED, "patient", fast_settings())
        .unwrap();
    catalog.set_available(false);

    let engine = engine(&catalog);
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(catalog.status(id).unwrap(), SessionStatus::Ready);
    assert!(engine.handle().active_sessions().await.unwrap().is_empty());

    catalog.set_available(true);
    wait_for_status(&catalog, id, SessionStatus::Ongoing).await;

    engine.shutdown().await.unwrap();
    assert_eq!(catalog.status(id).unwrap(), SessionStatus::Ended);
}

#[tokio::test(start_paused = true)]
async fn stop_session_leaves_other_sessions_running() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let first = catalog.create_ready(SCRIPTED, "first", fast_settings()).unwrap();
    let second = catalog.create_ready(SCRIPTED, "second", fast_settings()).unwrap();

    let engine = engine(&catalog);
    let handle = engine.handle();
    wait_for_status(&catalog, first, SessionStatus::Ongoing).await;
    wait_for_status(&catalog, second, SessionStatus::Ongoing).await;

    let mut rx = handle.subscribe(first);
    handle.stop_session(first).await.unwrap();
    let updates = collect_until_final(&mut rx).await;
    assert_eq!(updates.last().map(|u| u.status), Some(RunStatus::Ended));
    wait_for_status(&catalog, first, SessionStatus::Ended).await;

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(handle.active_sessions().await.unwrap(), vec![second]);
    assert_eq!(catalog.status(second).unwrap(), SessionStatus::Ongoing);

    let metrics = handle.session_metrics(second).await.unwrap();
    assert!(metrics.ticks > 0);
    assert!(matches!(
        handle.session_metrics(first).await,
        Err(EngineError::SessionNotFound(id)) if id == first
    ));

    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_ends_every_session() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let ids: Vec<_> = (0..3)
        .map(|i| {
            catalog
                .create_ready(SCRIPTED, format!("session-{i}"), fast_settings())
                .unwrap()
        })
        .collect();

    let engine = engine(&catalog);
    let handle = engine.handle();
    for id in &ids {
        wait_for_status(&catalog, *id, SessionStatus::Ongoing).await;
    }

    let mut receivers: Vec<_> = ids.iter().map(|id| handle.subscribe(*id)).collect();
    engine.shutdown().await.unwrap();

    for (id, rx) in ids.iter().zip(receivers.iter_mut()) {
        assert_eq!(catalog.status(*id).unwrap(), SessionStatus::Ended);
        let updates = collect_until_final(rx).await;
        assert_eq!(updates.last().map(|u| u.status), Some(RunStatus::Ended));
    }

    assert!(matches!(
        handle.active_sessions().await,
        Err(EngineError::CommandChannelClosed)
    ));
}

#[tokio::test]
async fn building_requires_a_catalog_and_games() {
    assert!(matches!(
        Engine::builder().build(),
        Err(EngineError::MissingCatalog)
    ));
    assert!(matches!(
        Engine::builder()
            .catalog(InMemoryCatalog::new())
            .registry(runtime::RulesRegistry::new())
            .build(),
        Err(EngineError::EmptyRegistry)
    ));
}

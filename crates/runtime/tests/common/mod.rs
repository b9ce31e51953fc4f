//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use game_core::{Entity, GameRules, InputSnapshot, RulesError, RunStatus, RunnerState, Settings};
use runtime::{
    Broadcast, EventBus, GameTypeId, InMemoryCatalog, ReadySession, RulesRegistry, RunnerConfig,
    SessionCatalog, SessionRecord, SessionRunner, SessionStatus,
};
use tokio::sync::broadcast;

/// Game type used for [`ScriptedRules`] in registry-based tests.
pub const SCRIPTED: GameTypeId = GameTypeId(100);

/// Rules whose behavior is fixed up front, counted in ticks.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRules {
    pub finish_at: Option<(u64, RunStatus)>,
    pub fail_at: Option<u64>,
    pub panic_at: Option<u64>,
    pub fail_initialize: bool,
    /// Panics whenever the entity list is rendered.
    pub panic_in_entities: bool,
    /// Blocks the worker thread for this long on every tick.
    pub block_for: Option<Duration>,
}

impl ScriptedRules {
    pub fn endless() -> Self {
        Self::default()
    }

    pub fn finishing(tick: u64, outcome: RunStatus) -> Self {
        Self {
            finish_at: Some((tick, outcome)),
            ..Self::default()
        }
    }

    pub fn failing(tick: u64) -> Self {
        Self {
            fail_at: Some(tick),
            ..Self::default()
        }
    }

    pub fn panicking(tick: u64) -> Self {
        Self {
            panic_at: Some(tick),
            ..Self::default()
        }
    }

    pub fn blocking(per_tick: Duration) -> Self {
        Self {
            block_for: Some(per_tick),
            ..Self::default()
        }
    }
}

impl GameRules for ScriptedRules {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn initialize(&mut self, state: &mut RunnerState) -> Result<(), RulesError> {
        if self.fail_initialize {
            return Err(RulesError::Internal("initialize refused".into()));
        }
        state.set_resource("ticks", 0);
        Ok(())
    }

    fn tick(&mut self, state: &mut RunnerState, _input: &InputSnapshot) -> Result<(), RulesError> {
        if let Some(duration) = self.block_for {
            std::thread::sleep(duration);
        }

        let tick = state.ticks;
        state.adjust_resource("ticks", 1);
        state.progress = u32::try_from(tick).unwrap_or(u32::MAX);

        if self.panic_at == Some(tick) {
            panic!("scripted panic at tick {tick}");
        }
        if self.fail_at == Some(tick) {
            return Err(RulesError::Internal(format!("scripted failure at tick {tick}")));
        }
        if let Some((at, outcome)) = self.finish_at
            && at == tick
        {
            state.finish(outcome);
        }
        Ok(())
    }

    fn entities(&mut self) -> Option<Vec<Entity>> {
        if self.panic_in_entities {
            panic!("scripted entity render failure");
        }
        None
    }
}

/// Registry with the built-in games plus [`ScriptedRules`] under [`SCRIPTED`].
///
/// The scripted rules are configured through the session settings:
/// `finish_at`, `outcome` ("won" or "lost"), `fail_at` and
/// `panic_in_entities`.
pub fn registry() -> RulesRegistry {
    let mut registry = RulesRegistry::with_builtin_games().expect("builtin games should load");
    registry.register(SCRIPTED, "scripted", |session| {
        let settings = &session.settings;
        let mut rules = ScriptedRules::endless();
        if let Some(tick) = settings.u64_opt(&["finish_at"])? {
            let outcome = match settings.get("outcome").and_then(|v| v.as_str()) {
                Some("lost") => RunStatus::Lost,
                _ => RunStatus::Won,
            };
            rules.finish_at = Some((tick, outcome));
        }
        rules.fail_at = settings.u64_opt(&["fail_at"])?;
        rules.panic_in_entities = settings
            .get("panic_in_entities")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(Box::new(rules))
    });
    registry
}

/// Settings giving a 100ms tick and 10 broadcasts per second.
pub fn fast_settings() -> Settings {
    Settings::new()
        .with("game_tick_rate", 0.1)
        .with("frames_per_second", 10)
}

/// Inserts a session that the dispatcher already moved to `starting`.
pub fn starting_session(catalog: &InMemoryCatalog, settings: Settings) -> ReadySession {
    let record = SessionRecord::new(SCRIPTED, "scripted", settings)
        .with_status(SessionStatus::Starting);
    let ready = record.to_ready();
    catalog.insert(record).expect("insert should succeed");
    ready
}

pub fn runner(
    session: &ReadySession,
    rules: ScriptedRules,
    config: RunnerConfig,
    catalog: &Arc<InMemoryCatalog>,
    bus: &EventBus,
) -> SessionRunner {
    SessionRunner::new(
        session,
        Box::new(rules),
        config,
        Arc::clone(catalog) as Arc<dyn SessionCatalog>,
        Arc::new(bus.clone()),
    )
}

/// Receives until the first `game_state` broadcast with a terminal status.
///
/// Returns every `game_state` update seen, the terminal one last.
pub async fn collect_until_final(
    rx: &mut broadcast::Receiver<Broadcast>,
) -> Vec<runtime::GameStateUpdate> {
    let mut updates = Vec::new();
    loop {
        match rx.recv().await {
            Ok(Broadcast::GameState(update)) => {
                let terminal = update.status.is_terminal();
                updates.push(update);
                if terminal {
                    return updates;
                }
            }
            Ok(Broadcast::ElemsUpdate(_)) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return updates,
        }
    }
}

/// Polls `catalog` until `id` reaches `status`, advancing time in small steps.
pub async fn wait_for_status(
    catalog: &InMemoryCatalog,
    id: runtime::SessionId,
    status: SessionStatus,
) {
    for _ in 0..1_000 {
        if catalog.status(id).expect("session should exist") == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "session {id} never reached {status}, history: {:?}",
        catalog.history(id)
    );
}

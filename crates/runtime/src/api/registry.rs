//! Rules registry mapping game types to rule factories.
//!
//! The [`RulesRegistry`] is built once before the engine starts and shared
//! read-only with the dispatcher. Each entry turns a [`ReadySession`] into a
//! fresh [`GameRules`] instance owned by that session's runner.
//!
//! # Design
//!
//! - **Static table**: no dynamic loading, unknown ids fail immediately
//! - **Shared content**: factories capture parsed content (e.g. the tower
//!   catalog) so it is loaded once, not per session

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use game_content::{TowerDefense, TowerLoader};
use game_core::{GameRules, RulesError};

use super::{EngineError, Result};
use crate::catalog::{GameTypeId, ReadySession};

/// Builds the rules of one session from its catalog entry.
pub type RulesFactory =
    Arc<dyn Fn(&ReadySession) -> std::result::Result<Box<dyn GameRules>, RulesError> + Send + Sync>;

#[derive(Clone)]
struct RegisteredGame {
    name: &'static str,
    factory: RulesFactory,
}

/// Registry of the games the engine can run.
#[derive(Clone, Default)]
pub struct RulesRegistry {
    games: HashMap<GameTypeId, RegisteredGame>,
}

impl RulesRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every game shipped in `game-content`.
    pub fn with_builtin_games() -> Result<Self> {
        let towers = Arc::new(
            TowerLoader::embedded().map_err(|e| RulesError::Content(e.to_string()))?,
        );

        Ok(Self::new().with_game(GameTypeId::TOWER_DEFENSE, TowerDefense::NAME, move |session| {
            let rules = TowerDefense::new(&session.settings, Arc::clone(&towers))?;
            Ok(Box::new(rules))
        }))
    }

    /// Register a factory for `game_type`.
    ///
    /// If a factory already exists for this id, it will be replaced.
    pub fn register<F>(&mut self, game_type: GameTypeId, name: &'static str, factory: F)
    where
        F: Fn(&ReadySession) -> std::result::Result<Box<dyn GameRules>, RulesError>
            + Send
            + Sync
            + 'static,
    {
        self.games.insert(
            game_type,
            RegisteredGame {
                name,
                factory: Arc::new(factory),
            },
        );
    }

    /// Builder-style [`Self::register`].
    pub fn with_game<F>(mut self, game_type: GameTypeId, name: &'static str, factory: F) -> Self
    where
        F: Fn(&ReadySession) -> std::result::Result<Box<dyn GameRules>, RulesError>
            + Send
            + Sync
            + 'static,
    {
        self.register(game_type, name, factory);
        self
    }

    /// Name registered for `game_type`.
    pub fn name(&self, game_type: GameTypeId) -> Option<&'static str> {
        self.games.get(&game_type).map(|game| game.name)
    }

    pub fn contains(&self, game_type: GameTypeId) -> bool {
        self.games.contains_key(&game_type)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Instantiate the rules for `session`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownGameType` if no factory is registered for
    /// the session's game type, or `EngineError::Rules` if the factory
    /// rejects the session settings.
    pub fn build(&self, session: &ReadySession) -> Result<Box<dyn GameRules>> {
        let game = self
            .games
            .get(&session.game_type)
            .ok_or(EngineError::UnknownGameType(session.game_type))?;

        Ok((game.factory)(session)?)
    }
}

impl fmt::Debug for RulesRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut games: Vec<_> = self
            .games
            .iter()
            .map(|(id, game)| (id.0, game.name))
            .collect();
        games.sort_unstable();
        f.debug_struct("RulesRegistry").field("games", &games).finish()
    }
}

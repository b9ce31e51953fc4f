//! Rule contract and shared data types for real-time game sessions.
//!
//! `game-core` defines what a concrete game has to implement ([`GameRules`])
//! and the values that flow between a game and the runtime driving it: the
//! per-session [`RunnerState`], [`Entity`] views, buffered [`ActorInput`], and
//! the [`StateSummary`] rendered for broadcasts. Nothing in this crate is
//! async or performs I/O; the runtime owns scheduling and delivery.
pub mod config;
pub mod error;
pub mod input;
pub mod rules;
pub mod state;

pub use config::Settings;
pub use error::RulesError;
pub use input::{ActorInput, HELD_KEYS, InputDelta, InputSnapshot, RELEASED_KEYS};
pub use rules::{GameRules, StateSummary};
pub use state::{ActorId, Cadence, Entity, EntityState, Position, RunStatus, RunnerState};

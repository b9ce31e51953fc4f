//! Group-based event bus for session broadcasts.
//!
//! Runners publish through the [`BroadcastGateway`] trait; [`EventBus`] is the
//! in-process implementation backed by `tokio::sync::broadcast` channels.

mod bus;
mod gateway;
mod types;

pub use bus::EventBus;
pub use gateway::BroadcastGateway;
pub use types::{Broadcast, ElemsUpdate, Envelope, GameStateUpdate};

//! Multi-session execution engine for real-time games.
//!
//! This crate wires together the session catalog, the rules registry, the
//! broadcast bus and the worker tasks into a cohesive engine API. Hosting
//! processes embed [`Engine`] to run every ready session of a catalog and
//! interact with running sessions through [`EngineHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`catalog`] defines the external session store and an in-memory one
//! - [`events`] provides the group-based broadcast bus
//! - [`config`] loads engine settings from the environment
//! - `workers` keeps the dispatcher and session runners internal to the crate
pub mod api;
pub mod catalog;
pub mod config;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{EngineError, EngineHandle, Result, RulesFactory, RulesRegistry};
pub use catalog::{
    CatalogError, GameTypeId, InMemoryCatalog, ReadySession, SessionCatalog, SessionId,
    SessionRecord, SessionStatus,
};
pub use config::{EngineConfig, RunnerConfig};
pub use events::{Broadcast, BroadcastGateway, ElemsUpdate, Envelope, EventBus, GameStateUpdate};
pub use runtime::{Engine, EngineBuilder};
pub use workers::{ClaimRegistry, InputBuffer, MetricsSnapshot, SessionRunner, TickMetrics};

//! High-level engine orchestrator.
//!
//! The engine owns the dispatcher task, wires up the command channel and the
//! broadcast bus, and exposes a builder-based API for hosting processes.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{EngineError, EngineHandle, Result, RulesRegistry};
use crate::catalog::{SessionCatalog, SessionId};
use crate::config::EngineConfig;
use crate::events::{Broadcast, EventBus};
use crate::workers::{Command, Dispatcher};

/// Main engine that runs every ready session of a catalog.
///
/// Design: Engine owns the dispatcher and coordinates shutdown.
/// [`EngineHandle`] provides a cloneable façade for clients.
pub struct Engine {
    handle: EngineHandle,
    dispatcher_handle: JoinHandle<()>,
}

impl Engine {
    /// Create a new engine builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Get a cloneable handle to this engine
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Subscribe to the broadcasts of one session
    pub fn subscribe(&self, id: SessionId) -> broadcast::Receiver<Broadcast> {
        self.handle.subscribe(id)
    }

    /// Stop every session and wait for the dispatcher to exit.
    ///
    /// Each running session is finalized: one last broadcast and an `ended`
    /// status write.
    pub async fn shutdown(self) -> Result<()> {
        // The dispatcher may already be gone if every handle was dropped.
        if let Err(error) = self.handle.shutdown().await {
            info!(target: "runtime::engine", %error, "dispatcher already stopped");
        }
        drop(self.handle);

        self.dispatcher_handle
            .await
            .map_err(EngineError::WorkerJoin)?;

        info!(target: "runtime::engine", "engine shut down");
        Ok(())
    }
}

/// Builder for [`Engine`] with flexible configuration.
pub struct EngineBuilder {
    config: EngineConfig,
    catalog: Option<Arc<dyn SessionCatalog>>,
    registry: Option<RulesRegistry>,
    event_bus: Option<EventBus>,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog: None,
            registry: None,
            event_bus: None,
        }
    }

    /// Override engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required session catalog
    pub fn catalog(self, catalog: impl SessionCatalog + 'static) -> Self {
        self.catalog_arc(Arc::new(catalog))
    }

    /// Set a catalog that is shared with other owners (e.g. tests inspecting
    /// the status history)
    pub fn catalog_arc(mut self, catalog: Arc<dyn SessionCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replace the built-in games.
    ///
    /// If not provided, [`RulesRegistry::with_builtin_games`] is used.
    pub fn registry(mut self, registry: RulesRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Publish broadcasts on an existing bus instead of a fresh one
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Build the engine and spawn its dispatcher
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Engine> {
        let catalog = self.catalog.ok_or(EngineError::MissingCatalog)?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => RulesRegistry::with_builtin_games()?,
        };
        if registry.is_empty() {
            return Err(EngineError::EmptyRegistry);
        }

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = EngineHandle::new(command_tx, event_bus.clone());

        let dispatcher = Dispatcher::new(
            self.config,
            catalog,
            Arc::new(event_bus),
            Arc::new(registry),
            command_rx,
        );

        let dispatcher_handle = tokio::spawn(async move {
            dispatcher.run().await;
        });

        Ok(Engine {
            handle,
            dispatcher_handle,
        })
    }
}

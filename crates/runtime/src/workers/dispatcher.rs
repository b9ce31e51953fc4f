//! Dispatcher that discovers ready sessions and owns their runners.
//!
//! A single task polls the catalog on a fixed interval, claims every newly
//! ready session exactly once, starts a [`SessionRunner`] bound to the
//! session's rules, and reaps runners that finished. Commands from
//! [`crate::EngineHandle`] are processed by the same loop, so the claim
//! registry needs no lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info, warn};

use game_core::{ActorId, Cadence, InputDelta};

use super::metrics::MetricsSnapshot;
use super::runner::SessionRunner;
use crate::api::{EngineError, Result, RulesRegistry};
use crate::catalog::{ReadySession, SessionCatalog, SessionId, SessionStatus, bounded};
use crate::config::EngineConfig;
use crate::events::BroadcastGateway;

/// Commands that can be sent to the dispatcher
pub enum Command {
    /// Start a session outside the poll cycle. Ignored if already claimed.
    StartSession { session: ReadySession },
    /// Stop a running session. Ignored if not claimed.
    StopSession { id: SessionId },
    /// Forward player input to a running session.
    SubmitInput {
        id: SessionId,
        actor: ActorId,
        delta: InputDelta,
    },
    /// Ids of every claimed session.
    ActiveSessions {
        reply: oneshot::Sender<Vec<SessionId>>,
    },
    /// Tick metrics of one claimed session.
    SessionMetrics {
        id: SessionId,
        reply: oneshot::Sender<Result<MetricsSnapshot>>,
    },
    /// Stop every runner and exit the loop.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Session ids with a live runner; at most one runner per id.
#[derive(Default)]
pub struct ClaimRegistry {
    runners: HashMap<SessionId, SessionRunner>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `runner` unless its session is already claimed.
    pub fn claim(&mut self, runner: SessionRunner) -> bool {
        match self.runners.entry(runner.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(runner);
                true
            }
        }
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.runners.contains_key(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<&SessionRunner> {
        self.runners.get(id)
    }

    pub fn release(&mut self, id: &SessionId) -> Option<SessionRunner> {
        self.runners.remove(id)
    }

    /// Removes and returns every runner that is no longer running.
    pub fn reap(&mut self) -> Vec<SessionRunner> {
        let finished: Vec<SessionId> = self
            .runners
            .iter()
            .filter(|(_, runner)| !runner.is_running())
            .map(|(id, _)| *id)
            .collect();

        finished
            .into_iter()
            .filter_map(|id| self.runners.remove(&id))
            .collect()
    }

    /// Empties the registry.
    pub fn drain(&mut self) -> Vec<SessionRunner> {
        self.runners.drain().map(|(_, runner)| runner).collect()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.runners.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }
}

/// Background task that assigns ready sessions to runners.
pub struct Dispatcher {
    config: EngineConfig,
    catalog: Arc<dyn SessionCatalog>,
    gateway: Arc<dyn BroadcastGateway>,
    registry: Arc<RulesRegistry>,
    claims: ClaimRegistry,
    command_rx: mpsc::Receiver<Command>,
}

impl Dispatcher {
    pub fn new(
        config: EngineConfig,
        catalog: Arc<dyn SessionCatalog>,
        gateway: Arc<dyn BroadcastGateway>,
        registry: Arc<RulesRegistry>,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        info!(
            target: "runtime::dispatcher",
            games = ?registry,
            poll_interval = ?config.poll_interval,
            "dispatcher initialized"
        );

        Self {
            config,
            catalog,
            gateway,
            registry,
            claims: ClaimRegistry::new(),
            command_rx,
        }
    }

    /// Main dispatcher loop.
    ///
    /// Exits on a shutdown command or once every handle is dropped; both
    /// stop all runners first.
    pub async fn run(mut self) {
        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        debug!(target: "runtime::dispatcher", "all engine handles dropped");
                        self.shutdown().await;
                        break;
                    }
                },
                _ = poll.tick() => self.poll_cycle().await,
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::StartSession { session } => self.launch(session).await,
            Command::StopSession { id } => match self.claims.get(&id) {
                Some(runner) => {
                    let runner = runner.clone();
                    tokio::spawn(async move { runner.stop().await });
                }
                None => debug!(target: "runtime::dispatcher", session = %id, "stop for unclaimed session ignored"),
            },
            Command::SubmitInput { id, actor, delta } => match self.claims.get(&id) {
                Some(runner) => runner.process_input(actor, delta),
                None => debug!(target: "runtime::dispatcher", session = %id, %actor, "input for unclaimed session dropped"),
            },
            Command::ActiveSessions { reply } => {
                if reply.send(self.claims.ids()).is_err() {
                    debug!(target: "runtime::dispatcher", "ActiveSessions reply channel closed (caller dropped)");
                }
            }
            Command::SessionMetrics { id, reply } => {
                let metrics = self
                    .claims
                    .get(&id)
                    .map(SessionRunner::metrics)
                    .ok_or(EngineError::SessionNotFound(id));
                if reply.send(metrics).is_err() {
                    debug!(target: "runtime::dispatcher", "SessionMetrics reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                self.shutdown().await;
                if reply.send(()).is_err() {
                    debug!(target: "runtime::dispatcher", "Shutdown reply channel closed (caller dropped)");
                }
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    /// One discovery cycle: list, launch unclaimed sessions, reap.
    async fn poll_cycle(&mut self) {
        let listed = bounded(
            "list_ready",
            self.config.status_write_timeout,
            self.catalog.list_ready(),
        )
        .await;

        match listed {
            Ok(ready) => {
                for session in ready {
                    if !self.claims.contains(&session.id) {
                        self.launch(session).await;
                    }
                }
            }
            Err(error) => {
                warn!(target: "runtime::dispatcher", %error, "failed to list ready sessions, skipping cycle");
            }
        }

        self.reap().await;
    }

    async fn launch(&mut self, session: ReadySession) {
        if self.claims.contains(&session.id) {
            debug!(target: "runtime::dispatcher", session = %session.id, "session already claimed");
            return;
        }

        if let Err(error) = self.write_status(&session, SessionStatus::Starting).await {
            warn!(
                target: "runtime::dispatcher",
                session = %session.id,
                %error,
                "failed to mark session starting, retrying next cycle"
            );
            return;
        }

        let runner = match self.prepare(&session) {
            Ok(runner) => runner,
            Err(error) => {
                error!(
                    target: "runtime::dispatcher",
                    session = %session.id,
                    game_type = %session.game_type,
                    %error,
                    "session configuration rejected"
                );
                if let Err(error) = self.write_status(&session, SessionStatus::Error).await {
                    warn!(target: "runtime::dispatcher", session = %session.id, %error, "failed to mark session as error");
                }
                return;
            }
        };

        runner.start().await;
        self.claims.claim(runner);
        info!(
            target: "runtime::dispatcher",
            session = %session.id,
            name = %session.name,
            active = self.claims.len(),
            "session claimed"
        );
    }

    fn prepare(&self, session: &ReadySession) -> Result<SessionRunner> {
        let rules = self.registry.build(session)?;
        let cadence = Cadence::from_settings(&session.settings)?;

        Ok(SessionRunner::new(
            session,
            rules,
            self.config.runner_config(cadence),
            Arc::clone(&self.catalog),
            Arc::clone(&self.gateway),
        ))
    }

    /// Releases runners whose tick task has exited.
    ///
    /// `stop` is a no-op for runners that finalized themselves and finalizes
    /// the ones whose task died.
    async fn reap(&mut self) {
        for runner in self.claims.reap() {
            runner.stop().await;
            self.gateway.close_group(runner.group());
            info!(
                target: "runtime::dispatcher",
                session = %runner.id(),
                ticks = runner.metrics().ticks,
                "session released"
            );
        }
    }

    /// Stops every runner concurrently, waiting a bounded time for each.
    async fn shutdown(&mut self) {
        let runners = self.claims.drain();
        if runners.is_empty() {
            info!(target: "runtime::dispatcher", "dispatcher shut down");
            return;
        }

        info!(target: "runtime::dispatcher", sessions = runners.len(), "stopping all sessions");
        let bound = self.config.stop_timeout + self.config.status_write_timeout;

        let stops: Vec<_> = runners
            .into_iter()
            .map(|runner| {
                let stopping = runner.clone();
                (runner, tokio::spawn(async move { stopping.stop().await }))
            })
            .collect();

        for (runner, stop) in stops {
            match timeout(bound, stop).await {
                Ok(Ok(())) => {}
                Ok(Err(join_error)) => {
                    error!(target: "runtime::dispatcher", session = %runner.id(), error = %join_error, "stop task failed");
                }
                Err(_) => {
                    warn!(target: "runtime::dispatcher", session = %runner.id(), bound = ?bound, "session did not stop in time");
                }
            }
            self.gateway.close_group(runner.group());
        }

        info!(target: "runtime::dispatcher", "dispatcher shut down");
    }

    async fn write_status(
        &self,
        session: &ReadySession,
        status: SessionStatus,
    ) -> std::result::Result<(), crate::catalog::CatalogError> {
        bounded(
            "write_status",
            self.config.status_write_timeout,
            self.catalog.write_status(session.id, status),
        )
        .await
    }
}

//! Cloneable façade for issuing commands to the engine.
//!
//! [`EngineHandle`] hides channel plumbing and offers async helpers for
//! starting and stopping sessions, feeding input, and streaming broadcasts.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::{ActorId, InputDelta};

use super::errors::{EngineError, Result};
use crate::catalog::{ReadySession, SessionId};
use crate::events::{Broadcast, Envelope, EventBus};
use crate::workers::{Command, MetricsSnapshot};

/// Client-facing handle to interact with the engine
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl EngineHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Start `session` without waiting for the next poll cycle.
    ///
    /// Returns once the dispatcher accepted the command. Sessions that are
    /// already claimed are ignored.
    pub async fn start_session(&self, session: ReadySession) -> Result<()> {
        self.send(Command::StartSession { session }).await
    }

    /// Request a running session to stop. Unknown ids are ignored.
    pub async fn stop_session(&self, id: SessionId) -> Result<()> {
        self.send(Command::StopSession { id }).await
    }

    /// Merge an input delta for `actor` into the session's input buffer.
    ///
    /// The delta is applied on the session's next tick. Input for sessions
    /// that are not running is dropped.
    pub async fn submit_input(
        &self,
        id: SessionId,
        actor: ActorId,
        delta: InputDelta,
    ) -> Result<()> {
        self.send(Command::SubmitInput { id, actor, delta }).await
    }

    /// Ids of the sessions that currently have a runner.
    pub async fn active_sessions(&self) -> Result<Vec<SessionId>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::ActiveSessions { reply: reply_tx }).await?;

        reply_rx.await.map_err(EngineError::ReplyChannelClosed)
    }

    /// Tick metrics of a running session.
    pub async fn session_metrics(&self, id: SessionId) -> Result<MetricsSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::SessionMetrics {
            id,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(EngineError::ReplyChannelClosed)?
    }

    /// Subscribe to the broadcasts of one session.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut rx = handle.subscribe(session_id);
    /// while let Ok(message) = rx.recv().await {
    ///     // forward to the session's clients
    /// }
    /// ```
    pub fn subscribe(&self, id: SessionId) -> broadcast::Receiver<Broadcast> {
        self.event_bus.subscribe(&id.group_name())
    }

    /// Subscribe to every broadcast of every session.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Envelope> {
        self.event_bus.subscribe_all()
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Shutdown { reply: reply_tx }).await?;

        reply_rx.await.map_err(EngineError::ReplyChannelClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| EngineError::CommandChannelClosed)
    }
}

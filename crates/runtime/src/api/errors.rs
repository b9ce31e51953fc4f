//! Unified error types surfaced by the engine API.
//!
//! Wraps failures from dispatcher coordination, the session catalog and rule
//! construction so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::RulesError;

pub use crate::catalog::CatalogError;
use crate::catalog::{GameTypeId, SessionId};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no rules registered for {0}")]
    UnknownGameType(GameTypeId),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("engine requires a session catalog to be configured before building")]
    MissingCatalog,

    #[error("engine requires at least one registered game")]
    EmptyRegistry,

    #[error("dispatcher command channel closed")]
    CommandChannelClosed,

    #[error("dispatcher reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("dispatcher join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("session {0} is not running")]
    SessionNotFound(SessionId),
}

impl EngineError {
    /// Errors that stem from the session's own configuration and will not go
    /// away by retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownGameType(_) | Self::Rules(_))
    }
}

//! Error types raised by session catalog implementations.

use std::time::Duration;

use thiserror::Error;

use super::types::{SessionId, SessionStatus};

/// Errors surfaced by [`super::SessionCatalog`] implementations.
///
/// All of them are treated as transient by the dispatcher: a failed read
/// makes the poll cycle empty and a failed write is logged.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("session catalog unavailable: {0}")]
    Unavailable(String),

    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("session {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("session catalog lock was poisoned")]
    LockPoisoned,

    #[error("session catalog {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

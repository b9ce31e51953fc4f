//! Errors raised by rule implementations.
//!
//! A [`RulesError`] returned from `initialize` or `tick` is fatal to the
//! session that produced it: the runner forces the `error` status and shuts
//! the session down. Errors returned while building a game from its settings
//! are configuration failures and keep the session from starting at all.

use thiserror::Error;

/// Failures surfaced by [`crate::GameRules`] implementations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RulesError {
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("unknown tower kind `{0}`")]
    UnknownTowerKind(String),

    #[error("content could not be loaded: {0}")]
    Content(String),

    #[error("rules panicked: {0}")]
    Panicked(String),

    #[error("internal rules error: {0}")]
    Internal(String),
}

impl RulesError {
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

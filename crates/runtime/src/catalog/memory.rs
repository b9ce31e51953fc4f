//! In-memory SessionCatalog implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use game_core::Settings;

use super::error::{CatalogError, Result};
use super::traits::SessionCatalog;
use super::types::{GameTypeId, ReadySession, SessionId, SessionRecord, SessionStatus};

/// In-memory implementation of SessionCatalog.
///
/// Enforces the monotonic status lifecycle and keeps the history of accepted
/// status changes per session so callers can inspect what the engine wrote.
pub struct InMemoryCatalog {
    records: RwLock<HashMap<SessionId, SessionRecord>>,
    history: RwLock<HashMap<SessionId, Vec<SessionStatus>>>,
    available: AtomicBool,
}

impl InMemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Stores `record` as is, replacing any record with the same id.
    pub fn insert(&self, record: SessionRecord) -> Result<SessionId> {
        let id = record.id;
        let status = record.status;

        self.records
            .write()
            .map_err(|_| CatalogError::LockPoisoned)?
            .insert(id, record);
        self.history
            .write()
            .map_err(|_| CatalogError::LockPoisoned)?
            .insert(id, vec![status]);
        Ok(id)
    }

    /// Creates a `pending` session.
    pub fn create(
        &self,
        game_type: GameTypeId,
        name: impl Into<String>,
        settings: Settings,
    ) -> Result<SessionId> {
        self.insert(SessionRecord::new(game_type, name, settings))
    }

    /// Creates a session and moves it straight to `ready`.
    pub fn create_ready(
        &self,
        game_type: GameTypeId,
        name: impl Into<String>,
        settings: Settings,
    ) -> Result<SessionId> {
        let id = self.create(game_type, name, settings)?;
        self.apply(id, SessionStatus::Ready)?;
        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        let records = self.records.read().map_err(|_| CatalogError::LockPoisoned)?;
        Ok(records.get(&id).cloned())
    }

    pub fn status(&self, id: SessionId) -> Result<SessionStatus> {
        self.get(id)?
            .map(|record| record.status)
            .ok_or(CatalogError::NotFound(id))
    }

    /// Every status the session went through, starting with its initial one.
    pub fn history(&self, id: SessionId) -> Result<Vec<SessionStatus>> {
        let history = self.history.read().map_err(|_| CatalogError::LockPoisoned)?;
        history.get(&id).cloned().ok_or(CatalogError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulates an outage: while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CatalogError::Unavailable("catalog marked unavailable".into()))
        }
    }

    fn apply(&self, id: SessionId, status: SessionStatus) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| CatalogError::LockPoisoned)?;
        let record = records.get_mut(&id).ok_or(CatalogError::NotFound(id))?;

        if record.status == status {
            return Ok(());
        }
        if !record.status.can_transition_to(status) {
            return Err(CatalogError::InvalidTransition {
                id,
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        match status {
            SessionStatus::Ongoing => record.started_at = Some(Utc::now()),
            SessionStatus::Ended | SessionStatus::Error => record.ended_at = Some(Utc::now()),
            _ => {}
        }

        self.history
            .write()
            .map_err(|_| CatalogError::LockPoisoned)?
            .entry(id)
            .or_default()
            .push(status);
        Ok(())
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionCatalog for InMemoryCatalog {
    async fn list_ready(&self) -> Result<Vec<ReadySession>> {
        self.ensure_available()?;

        let records = self.records.read().map_err(|_| CatalogError::LockPoisoned)?;
        let mut ready: Vec<&SessionRecord> = records
            .values()
            .filter(|record| record.status == SessionStatus::Ready)
            .collect();
        ready.sort_by_key(|record| record.created_at);

        Ok(ready.into_iter().map(SessionRecord::to_ready).collect())
    }

    async fn write_status(&self, id: SessionId, status: SessionStatus) -> Result<()> {
        self.ensure_available()?;
        self.apply(id, status)
    }
}

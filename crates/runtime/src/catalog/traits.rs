//! Catalog contract consumed by the engine.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{CatalogError, Result};
use super::types::{ReadySession, SessionId, SessionStatus};

/// Persisted session catalog.
///
/// The engine only discovers ready sessions and writes their status; creating,
/// listing and configuring sessions belongs to the service that owns the
/// catalog.
#[async_trait]
pub trait SessionCatalog: Send + Sync {
    /// Sessions whose status is `ready`.
    async fn list_ready(&self) -> Result<Vec<ReadySession>>;

    /// Writes `status` for `id`. Writing the current status again succeeds.
    async fn write_status(&self, id: SessionId, status: SessionStatus) -> Result<()>;
}

/// Bounds a catalog call by `after`.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| CatalogError::Timeout { operation, after })?
}

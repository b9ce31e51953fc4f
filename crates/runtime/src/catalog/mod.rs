//! Session catalog contract and the in-memory reference implementation.
//!
//! The real catalog is owned by an external service; the engine only reads
//! ready sessions and writes lifecycle statuses through [`SessionCatalog`].

mod error;
mod memory;
mod traits;
mod types;

pub use error::{CatalogError, Result};
pub use memory::InMemoryCatalog;
pub use traits::SessionCatalog;
pub(crate) use traits::bounded;
pub use types::{GameTypeId, ReadySession, SessionId, SessionRecord, SessionStatus};

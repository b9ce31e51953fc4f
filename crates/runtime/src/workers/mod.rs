//! Worker tasks that back the engine.
//!
//! The dispatcher discovers sessions and owns one runner per session; each
//! runner drives its session's rules on a dedicated task.

mod dispatcher;
mod input;
mod metrics;
mod runner;

pub(crate) use dispatcher::{Command, Dispatcher};
pub use dispatcher::ClaimRegistry;
pub use input::InputBuffer;
pub use metrics::{MetricsSnapshot, TickMetrics};
pub use runner::SessionRunner;

//! Fan-out contract used by session runners.

use super::types::Broadcast;

/// Delivers broadcasts to the viewers of a group.
///
/// Publishing is fire-and-forget and must not block: runners call it from
/// their tick loop.
pub trait BroadcastGateway: Send + Sync {
    fn publish(&self, group: &str, message: Broadcast);

    /// Drops the group once its session is gone.
    fn close_group(&self, group: &str);
}

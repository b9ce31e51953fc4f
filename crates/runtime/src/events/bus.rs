//! Group-based event bus implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use super::gateway::BroadcastGateway;
use super::types::{Broadcast, Envelope};

/// Group-based event bus
///
/// Each session publishes to its own group (`game_<id>`); consumers subscribe
/// to the groups they display. A firehose channel additionally carries every
/// message of every group, tagged with its group name.
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    capacity: usize,
    groups: RwLock<Groups>,
    firehose: broadcast::Sender<Envelope>,
}

#[derive(Default)]
struct Groups {
    open: HashMap<String, broadcast::Sender<Broadcast>>,
    /// Released by `close_group`; never reopened.
    closed: HashSet<String>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each group
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per group
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(BusInner {
                capacity,
                groups: RwLock::new(Groups::default()),
                firehose: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Subscribe to a single group, creating it on first use.
    ///
    /// A group that was already closed stays closed: the receiver reports
    /// [`broadcast::error::RecvError::Closed`] straight away.
    pub fn subscribe(&self, group: &str) -> broadcast::Receiver<Broadcast> {
        let mut groups = self
            .inner
            .groups
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if groups.closed.contains(group) {
            tracing::debug!(target: "runtime::events", group, "subscription to a closed group");
            return broadcast::channel(1).1;
        }
        groups
            .open
            .entry(group.to_owned())
            .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
            .subscribe()
    }

    /// Subscribe to every group at once.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Envelope> {
        self.inner.firehose.subscribe()
    }

    /// Number of groups that currently have a channel.
    pub fn group_count(&self) -> usize {
        self.inner
            .groups
            .read()
            .map(|groups| groups.open.len())
            .unwrap_or(0)
    }
}

impl BroadcastGateway for EventBus {
    fn publish(&self, group: &str, message: Broadcast) {
        match self.inner.groups.read() {
            Ok(groups) => {
                if let Some(tx) = groups.open.get(group)
                    && tx.send(message.clone()).is_err()
                {
                    // No subscribers left for this group - this is normal
                    tracing::trace!(target: "runtime::events", group, "no subscribers for group");
                }
            }
            Err(_) => {
                tracing::debug!(target: "runtime::events", group, "event bus lock poisoned, skipping group");
            }
        }

        if self.inner.firehose.receiver_count() > 0 {
            let _ = self.inner.firehose.send(Envelope {
                group: group.to_owned(),
                message,
            });
        }
    }

    fn close_group(&self, group: &str) {
        let Ok(mut groups) = self.inner.groups.write() else {
            return;
        };
        groups.closed.insert(group.to_owned());
        if groups.open.remove(group).is_some() {
            tracing::debug!(target: "runtime::events", group, "group closed");
        }
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

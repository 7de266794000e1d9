//! Per-session synchronizer.
//!
//! # Responsibility
//! - Publish locally originated mutations to other sessions.
//! - Apply received messages to a task store through the reducers.
//!
//! # Invariants
//! - Publishing failures are logged and never undo local state.
//! - Received messages are applied without re-running intent validation.

use crate::store::task_store::TaskStore;
use crate::sync::channel::{BroadcastChannel, BroadcastHub, SyncError};
use crate::sync::message::SyncMessage;
use crate::sync::reducer::{reduce, ReduceOutcome};
use log::{debug, error};

/// Broadcast endpoint bound to one session.
pub struct TabSynchronizer {
    channel: BroadcastChannel,
}

impl TabSynchronizer {
    /// Joins `topic` on `hub`.
    pub fn join(hub: &BroadcastHub, topic: &str) -> Result<Self, SyncError> {
        let channel = hub.channel(topic)?;
        debug!(
            "event=sync_join module=sync status=ok peers={}",
            hub.subscriber_count(channel.topic()).saturating_sub(1)
        );
        Ok(Self { channel })
    }

    pub fn topic(&self) -> &str {
        self.channel.topic()
    }

    /// Broadcasts one message; returns the delivery count (0 on failure).
    pub fn publish(&self, message: &SyncMessage) -> usize {
        match self.channel.post(message) {
            Ok(delivered) => delivered,
            Err(err) => {
                error!(
                    "event=sync_publish module=sync status=error type={} error={}",
                    message.tag(),
                    err
                );
                0
            }
        }
    }

    /// Takes every message received since the last call.
    pub fn pending(&self) -> Vec<SyncMessage> {
        self.channel.drain()
    }

    /// Applies one received message to `store`.
    pub fn apply(&self, store: &mut TaskStore, message: &SyncMessage) -> ReduceOutcome {
        let outcome = reduce(store.tasks_mut(), message);
        debug!(
            "event=sync_apply module=sync status={} type={} count={}",
            if outcome.changed() { "applied" } else { "ignored" },
            message.tag(),
            store.len()
        );
        outcome
    }
}

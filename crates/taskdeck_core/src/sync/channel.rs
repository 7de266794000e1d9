//! In-process broadcast hub.
//!
//! # Responsibility
//! - Route JSON-encoded sync messages between endpoints of one topic.
//! - Queue deliveries per endpoint so each session drains them in order.
//!
//! # Invariants
//! - A post is never delivered back to the posting endpoint.
//! - Endpoints whose receiver is gone are pruned on the next post.
//! - Undecodable payloads are skipped, never surfaced as errors.

use crate::config::validate_namespace;
use crate::sync::message::SyncMessage;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};

static GLOBAL_HUB: Lazy<BroadcastHub> = Lazy::new(BroadcastHub::new);

/// Broadcast delivery errors.
#[derive(Debug)]
pub enum SyncError {
    InvalidTopic(String),
    Encode(serde_json::Error),
    HubPoisoned,
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTopic(topic) => write!(f, "invalid broadcast topic: `{topic}`"),
            Self::Encode(err) => write!(f, "failed to encode sync message: {err}"),
            Self::HubPoisoned => write!(f, "broadcast hub lock poisoned"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::InvalidTopic(_) | Self::HubPoisoned => None,
        }
    }
}

struct Subscriber {
    endpoint: u64,
    sender: Sender<String>,
}

#[derive(Default)]
struct HubState {
    next_endpoint: u64,
    topics: HashMap<String, Vec<Subscriber>>,
}

/// Registry of broadcast topics.
///
/// Clones share the same topics, so every session created from one hub
/// sees the others.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    state: Arc<Mutex<HubState>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide hub used by the FFI entry points.
    pub fn global() -> &'static BroadcastHub {
        &GLOBAL_HUB
    }

    /// Opens a new endpoint on `topic`.
    pub fn channel(&self, topic: &str) -> Result<BroadcastChannel, SyncError> {
        let topic = validate_namespace("channel", topic.trim())
            .map_err(|_| SyncError::InvalidTopic(topic.to_string()))?;
        let (sender, receiver) = channel();
        let mut state = self.lock()?;
        state.next_endpoint += 1;
        let endpoint = state.next_endpoint;
        state
            .topics
            .entry(topic.clone())
            .or_default()
            .push(Subscriber { endpoint, sender });
        debug!("event=channel_open module=sync status=ok endpoint={endpoint}");

        Ok(BroadcastChannel {
            hub: self.clone(),
            topic,
            endpoint,
            receiver,
        })
    }

    /// Number of live endpoints on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock()
            .map(|state| state.topics.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn deliver(&self, topic: &str, from: u64, payload: &str) -> Result<usize, SyncError> {
        let mut state = self.lock()?;
        let Some(subscribers) = state.topics.get_mut(topic) else {
            return Ok(0);
        };
        let mut delivered = 0;
        subscribers.retain(|subscriber| {
            if subscriber.endpoint == from {
                return true;
            }
            match subscriber.sender.send(payload.to_string()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        Ok(delivered)
    }

    fn unsubscribe(&self, topic: &str, endpoint: u64) {
        if let Ok(mut state) = self.lock() {
            if let Some(subscribers) = state.topics.get_mut(topic) {
                subscribers.retain(|subscriber| subscriber.endpoint != endpoint);
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>, SyncError> {
        self.state.lock().map_err(|_| SyncError::HubPoisoned)
    }
}

/// One endpoint on a broadcast topic.
pub struct BroadcastChannel {
    hub: BroadcastHub,
    topic: String,
    endpoint: u64,
    receiver: Receiver<String>,
}

impl BroadcastChannel {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Sends `message` to every other endpoint; returns the delivery count.
    pub fn post(&self, message: &SyncMessage) -> Result<usize, SyncError> {
        let payload = message.to_json().map_err(SyncError::Encode)?;
        let delivered = self.hub.deliver(&self.topic, self.endpoint, &payload)?;
        debug!(
            "event=channel_post module=sync status=ok type={} endpoint={} delivered={}",
            message.tag(),
            self.endpoint,
            delivered
        );
        Ok(delivered)
    }

    /// Returns the next decodable queued message, if any.
    pub fn try_recv(&self) -> Option<SyncMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(raw) => match SyncMessage::from_json(&raw) {
                    Ok(message) => return Some(message),
                    Err(err) => {
                        warn!(
                            "event=channel_recv module=sync status=skipped endpoint={} error={}",
                            self.endpoint, err
                        );
                    }
                },
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Drains all queued messages in arrival order.
    pub fn drain(&self) -> Vec<SyncMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for BroadcastChannel {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.topic, self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::{BroadcastHub, SyncError};
    use crate::model::id::TaskId;
    use crate::sync::message::SyncMessage;

    #[test]
    fn post_reaches_other_endpoints_but_not_sender() {
        let hub = BroadcastHub::new();
        let a = hub.channel("taskdeck.sync.v1").unwrap();
        let b = hub.channel("taskdeck.sync.v1").unwrap();
        let c = hub.channel("taskdeck.sync.v1").unwrap();

        let delivered = a.post(&SyncMessage::TaskDeleted(TaskId::Number(1))).unwrap();
        assert_eq!(delivered, 2);
        assert!(a.try_recv().is_none());
        assert_eq!(b.drain().len(), 1);
        assert_eq!(c.drain().len(), 1);
    }

    #[test]
    fn topics_are_isolated() {
        let hub = BroadcastHub::new();
        let a = hub.channel("app.one").unwrap();
        let b = hub.channel("app.two").unwrap();
        assert_eq!(a.post(&SyncMessage::TaskDeleted(TaskId::Number(1))).unwrap(), 0);
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn messages_drain_in_arrival_order() {
        let hub = BroadcastHub::new();
        let a = hub.channel("topic").unwrap();
        let b = hub.channel("topic").unwrap();
        for id in 1..=3 {
            a.post(&SyncMessage::TaskDeleted(TaskId::Number(id))).unwrap();
        }
        let ids = b
            .drain()
            .into_iter()
            .map(|message| match message {
                SyncMessage::TaskDeleted(id) => id,
                other => panic!("unexpected message {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![TaskId::Number(1), TaskId::Number(2), TaskId::Number(3)]);
    }

    #[test]
    fn dropped_endpoint_is_unsubscribed() {
        let hub = BroadcastHub::new();
        let a = hub.channel("topic").unwrap();
        let b = hub.channel("topic").unwrap();
        assert_eq!(hub.subscriber_count("topic"), 2);
        drop(b);
        assert_eq!(hub.subscriber_count("topic"), 1);
        assert_eq!(a.post(&SyncMessage::TaskDeleted(TaskId::Number(1))).unwrap(), 0);
    }

    #[test]
    fn undecodable_payloads_are_skipped() {
        let hub = BroadcastHub::new();
        let b = hub.channel("topic").unwrap();
        hub.deliver("topic", 0, "not json").unwrap();
        hub.deliver("topic", 0, r#"{"type":"TASK_DELETED","data":7}"#)
            .unwrap();
        assert_eq!(b.try_recv(), Some(SyncMessage::TaskDeleted(TaskId::Number(7))));
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn rejects_invalid_topic() {
        let hub = BroadcastHub::new();
        assert!(matches!(hub.channel("Bad Topic"), Err(SyncError::InvalidTopic(_))));
    }
}

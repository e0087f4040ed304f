//! Fan-out of relay messages to every connected session
//!
//! The hub is a single named topic. Each subscriber is the sending half of an
//! unbounded queue drained by that connection's writer task, so a publish never
//! waits on a slow socket. A subscriber whose connection is gone simply fails its
//! own send; the remaining subscribers are unaffected.

use log::debug;
use shared::{ServerMessage, SessionId};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};

/// Outbound queue of one connection
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

pub struct BroadcastHub {
    topic: &'static str,
    subscribers: RwLock<HashMap<SessionId, Outbox>>,
}

impl BroadcastHub {
    pub fn new(topic: &'static str) -> Self {
        Self {
            topic,
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }

    /// Registers `outbox` to receive every later publish
    ///
    /// Subscribing an id twice replaces the earlier queue.
    pub async fn subscribe(&self, session_id: SessionId, outbox: Outbox) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(session_id, outbox);
        debug!("Session {} subscribed to '{}'", session_id, self.topic);
    }

    /// Returns true if the session was subscribed
    pub async fn unsubscribe(&self, session_id: SessionId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(&session_id).is_some();
        if removed {
            debug!("Session {} unsubscribed from '{}'", session_id, self.topic);
        }
        removed
    }

    /// Delivers `message` to every current subscriber, the sender included
    ///
    /// Works on a snapshot of the subscriber set taken under the read lock, so
    /// sessions joining or leaving mid-publish never disturb the iteration.
    /// Returns the number of queues that accepted the message.
    pub async fn publish(&self, message: &ServerMessage) -> usize {
        let targets: Vec<(SessionId, Outbox)> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .iter()
                .map(|(id, outbox)| (*id, outbox.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (session_id, outbox) in targets {
            if outbox.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(
                    "Dropped '{}' message for session {}: connection closed",
                    self.topic, session_id
                );
            }
        }
        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_subscribed(&self, session_id: SessionId) -> bool {
        self.subscribers.read().await.contains_key(&session_id)
    }
}

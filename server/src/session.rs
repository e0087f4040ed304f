//! Session bookkeeping for connected clients
//!
//! This module handles the server-side identity of each connection:
//! - Session id assignment at accept time, drawn from the shared world counter
//! - Subscription of the new session to the broadcast hub before any message exchange
//! - Release of the session and its subscription when the connection closes
//!
//! Ids are never recycled; a reconnecting client always gets a fresh one.

use crate::hub::{BroadcastHub, Outbox};
use crate::world::WorldState;
use log::info;
use shared::{ServerMessage, SessionId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};

/// One connected client
///
/// Holds the id bound to the connection for its whole lifetime and the
/// outbound queue drained by the connection's writer task.
#[derive(Debug)]
pub struct Session {
    /// Unique id assigned by the registry
    pub id: SessionId,
    /// Peer address, kept for logging
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
    outbox: Outbox,
}

impl Session {
    /// Sends `message` to this session only
    ///
    /// Best-effort: returns false if the connection is already gone.
    pub fn send(&self, message: ServerMessage) -> bool {
        self.outbox.send(message).is_ok()
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Tracks every live session and ties it to the broadcast hub
pub struct SessionRegistry {
    world: Arc<WorldState>,
    hub: Arc<BroadcastHub>,
    sessions: RwLock<HashMap<SessionId, SocketAddr>>,
}

impl SessionRegistry {
    pub fn new(world: Arc<WorldState>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            world,
            hub,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Admits a new connection
    ///
    /// Assigns the next session id, subscribes the session to the hub and
    /// records it. Returns the session together with the receiving half of its
    /// outbound queue, which the transport drains into the socket.
    pub async fn accept(
        &self,
        addr: SocketAddr,
    ) -> (Session, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = self.world.next_session_id();
        let (outbox, inbox) = mpsc::unbounded_channel();

        self.hub.subscribe(id, outbox.clone()).await;
        self.sessions.write().await.insert(id, addr);
        info!("Session {} connected from {}", id, addr);

        let session = Session {
            id,
            addr,
            connected_at: Instant::now(),
            outbox,
        };
        (session, inbox)
    }

    /// Forgets a closed session and stops broadcasting to it
    ///
    /// Returns true if the session was still registered.
    pub async fn release(&self, session: &Session) -> bool {
        self.hub.unsubscribe(session.id).await;
        let removed = self.sessions.write().await.remove(&session.id).is_some();
        if removed {
            info!(
                "Session {} disconnected after {:.1}s",
                session.id,
                session.connected_for().as_secs_f64()
            );
        }
        removed
    }

    pub async fn addr_of(&self, session_id: SessionId) -> Option<SocketAddr> {
        self.sessions.read().await.get(&session_id).copied()
    }

    /// Ids of all live sessions, in ascending order
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

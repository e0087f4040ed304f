//! Per-connection dispatch of inbound client messages

use crate::hub::BroadcastHub;
use crate::session::Session;
use crate::world::WorldState;
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::sync::Arc;

/// What the router did with one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Answered the sender directly
    Replied,
    /// Published to the hub; `delivered` queues accepted it
    Broadcast { delivered: usize },
    /// Unrecognised or malformed; nothing was sent and no state changed
    Ignored,
}

#[derive(Clone)]
pub struct MessageRouter {
    world: Arc<WorldState>,
    hub: Arc<BroadcastHub>,
}

impl MessageRouter {
    pub fn new(world: Arc<WorldState>, hub: Arc<BroadcastHub>) -> Self {
        Self { world, hub }
    }

    /// Decodes a raw text frame and routes it
    ///
    /// Malformed frames are logged and dropped; the connection stays open.
    pub async fn route_text(&self, session: &Session, text: &str) -> Dispatch {
        match ClientMessage::decode(text) {
            Ok(message) => self.route(session, message).await,
            Err(e) => {
                warn!("Ignoring malformed message from session {}: {}", session.id, e);
                Dispatch::Ignored
            }
        }
    }

    pub async fn route(&self, session: &Session, message: ClientMessage) -> Dispatch {
        match message {
            ClientMessage::Hello => {
                let reply = ServerMessage::Hello {
                    ticks: self.world.ticks_elapsed(),
                    id: session.id,
                    beacon: self.world.current_beacon(),
                };
                if !session.send(reply) {
                    debug!("Session {} closed before hello reply", session.id);
                }
                Dispatch::Replied
            }
            ClientMessage::Event(fields) => {
                let delivered = self
                    .hub
                    .publish(&ServerMessage::event(fields, session.id))
                    .await;
                Dispatch::Broadcast { delivered }
            }
            ClientMessage::Beacon => {
                let beacon = self.world.reroll_beacon();
                debug!(
                    "Session {} moved beacon to ({}, {})",
                    session.id, beacon.x, beacon.y
                );
                let delivered = self
                    .hub
                    .publish(&ServerMessage::Beacon {
                        id: session.id,
                        beacon,
                    })
                    .await;
                Dispatch::Broadcast { delivered }
            }
            ClientMessage::Unknown(kind) => {
                info!("Unknown message type from session {}: {}", session.id, kind);
                Dispatch::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::session::SessionRegistry;
    use serde_json::{json, Map, Value};
    use shared::EVENTS_TOPIC;
    use std::net::SocketAddr;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        world: Arc<WorldState>,
        registry: SessionRegistry,
        router: MessageRouter,
    }

    fn fixture() -> Fixture {
        let world = Arc::new(WorldState::new(RelayConfig::default()).unwrap());
        let hub = Arc::new(BroadcastHub::new(EVENTS_TOPIC));
        Fixture {
            registry: SessionRegistry::new(Arc::clone(&world), Arc::clone(&hub)),
            router: MessageRouter::new(Arc::clone(&world), hub),
            world,
        }
    }

    async fn connect(fixture: &Fixture, port: u16) -> (Session, UnboundedReceiver<ServerMessage>) {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        fixture.registry.accept(addr).await
    }

    fn encoded(message: ServerMessage) -> Value {
        serde_json::from_str(&message.encode().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_hello_replies_to_sender_only() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;
        let (_b, mut rx_b) = connect(&fixture, 9002).await;

        let dispatch = fixture.router.route_text(&a, r#"{"type":"hello"}"#).await;
        assert_eq!(dispatch, Dispatch::Replied);

        match rx_a.try_recv().unwrap() {
            ServerMessage::Hello { ticks, id, beacon } => {
                assert!(ticks >= 0.0 && ticks < 30.0);
                assert_eq!(id, 1);
                assert_eq!(beacon, fixture.world.current_beacon());
                assert!(beacon.is_within(800, 600));
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_event_broadcast_with_sender_id() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;
        let (_b, mut rx_b) = connect(&fixture, 9002).await;

        let dispatch = fixture
            .router
            .route_text(&a, r#"{"type":"event","payload":"fire"}"#)
            .await;
        assert_eq!(dispatch, Dispatch::Broadcast { delivered: 2 });

        let expected = json!({"type": "event", "payload": "fire", "id": 1});
        assert_eq!(encoded(rx_a.try_recv().unwrap()), expected);
        assert_eq!(encoded(rx_b.try_recv().unwrap()), expected);
    }

    #[tokio::test]
    async fn test_beacon_reroll_broadcast_and_visible_in_hello() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;
        let (b, mut rx_b) = connect(&fixture, 9002).await;

        let dispatch = fixture.router.route(&a, ClientMessage::Beacon).await;
        assert_eq!(dispatch, Dispatch::Broadcast { delivered: 2 });

        let announced = match rx_a.try_recv().unwrap() {
            ServerMessage::Beacon { id, beacon } => {
                assert_eq!(id, a.id);
                beacon
            }
            other => panic!("Unexpected message: {:?}", other),
        };
        assert_eq!(
            rx_b.try_recv().unwrap(),
            ServerMessage::Beacon {
                id: a.id,
                beacon: announced
            }
        );
        assert_eq!(fixture.world.current_beacon(), announced);

        fixture.router.route(&b, ClientMessage::Hello).await;
        match rx_b.try_recv().unwrap() {
            ServerMessage::Hello { beacon, id, .. } => {
                assert_eq!(id, b.id);
                assert_eq!(beacon, announced);
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_type_is_ignored() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;
        let (_b, mut rx_b) = connect(&fixture, 9002).await;
        let beacon_before = fixture.world.current_beacon();

        let dispatch = fixture.router.route_text(&a, r#"{"type":"bogus"}"#).await;
        assert_eq!(dispatch, Dispatch::Ignored);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
        assert_eq!(fixture.world.current_beacon(), beacon_before);

        // Still usable afterwards
        let dispatch = fixture.router.route_text(&a, r#"{"type":"hello"}"#).await;
        assert_eq!(dispatch, Dispatch::Replied);
        assert!(rx_a.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_malformed_frames_are_ignored() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;

        for text in ["", "not json", "42", r#"{"payload":"fire"}"#, r#"{"type":null}"#] {
            let dispatch = fixture.router.route_text(&a, text).await;
            assert_eq!(dispatch, Dispatch::Ignored, "frame {:?}", text);
        }
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_event_survives_departed_subscriber() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;
        let (_b, rx_b) = connect(&fixture, 9002).await;
        drop(rx_b);

        let mut fields = Map::new();
        fields.insert("payload".to_string(), json!("fire"));
        let dispatch = fixture.router.route(&a, ClientMessage::Event(fields)).await;

        assert_eq!(dispatch, Dispatch::Broadcast { delivered: 1 });
        assert!(rx_a.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_messages_from_one_session_keep_order() {
        let fixture = fixture();
        let (a, mut rx_a) = connect(&fixture, 9001).await;

        for seq in 0..20 {
            let text = format!(r#"{{"type":"event","seq":{}}}"#, seq);
            fixture.router.route_text(&a, &text).await;
        }

        for seq in 0..20 {
            let value = encoded(rx_a.try_recv().unwrap());
            assert_eq!(value["seq"], json!(seq));
        }
    }
}

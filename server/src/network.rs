//! Server network layer: WebSocket accept loop and per-connection tasks

use crate::config::RelayConfig;
use crate::error::{ConfigError, RelayError};
use crate::hub::BroadcastHub;
use crate::router::MessageRouter;
use crate::session::{Session, SessionRegistry};
use crate::world::WorldState;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ServerMessage, SessionId, EVENTS_TOPIC};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Shared state handed to every connection task
#[derive(Clone)]
pub struct Relay {
    pub world: Arc<WorldState>,
    pub hub: Arc<BroadcastHub>,
    pub registry: Arc<SessionRegistry>,
    pub router: MessageRouter,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        let world = Arc::new(WorldState::new(config)?);
        let hub = Arc::new(BroadcastHub::new(EVENTS_TOPIC));
        let registry = Arc::new(SessionRegistry::new(Arc::clone(&world), Arc::clone(&hub)));
        let router = MessageRouter::new(Arc::clone(&world), Arc::clone(&hub));

        Ok(Relay {
            world,
            hub,
            registry,
            router,
        })
    }
}

/// Listening relay server
pub struct Server {
    listener: TcpListener,
    relay: Relay,
}

impl Server {
    /// Validates `config`, then binds the listener
    ///
    /// An invalid configuration fails before any socket is opened.
    pub async fn bind(addr: &str, config: RelayConfig) -> Result<Self, RelayError> {
        let relay = Relay::new(config)?;
        let listener = TcpListener::bind(addr).await?;
        info!(
            "Server listening on ws://{} ({} ticks/s, beacon bounds {}x{})",
            listener.local_addr()?,
            config.ticks_per_second,
            config.width,
            config.height
        );

        Ok(Server { listener, relay })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Accepts connections forever, one task per connection
    pub async fn run(self) -> Result<(), RelayError> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let relay = self.relay.clone();
                    tokio::spawn(async move {
                        handle_connection(relay, stream, addr).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Runs until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("Server shutting down");
                Ok(())
            }
        }
    }
}

/// Drives one client from handshake to disconnect
async fn handle_connection(relay: Relay, stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for {}: {}", addr, e);
    }

    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (session, inbox) = relay.registry.accept(addr).await;
    let (sink, mut frames) = socket.split();
    tokio::spawn(write_outbound(session.id, sink, inbox));

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                relay.router.route_text(&session, &text).await;
            }
            Ok(Message::Binary(bytes)) => route_binary(&relay, &session, bytes).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Session {} read failed: {}", session.id, e);
                break;
            }
        }
    }

    // Dropping the session closes its queue, which ends the writer task
    relay.registry.release(&session).await;
}

async fn route_binary(relay: &Relay, session: &Session, bytes: Vec<u8>) {
    match String::from_utf8(bytes) {
        Ok(text) => {
            relay.router.route_text(session, &text).await;
        }
        Err(_) => warn!("Ignoring non-UTF-8 binary frame from session {}", session.id),
    }
}

/// Drains a session's outbound queue into its socket
async fn write_outbound(
    session_id: SessionId,
    mut sink: futures_util::stream::SplitSink<WebSocketStream<TcpStream>, Message>,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = inbox.recv().await {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode message for session {}: {}", session_id, e);
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text)).await {
            debug!("Send to session {} failed: {}", session_id, e);
            return;
        }
    }

    let _ = sink.close().await;
}

//! # Relay Server Library
//!
//! This library provides the real-time relay behind the multiplayer game. It
//! accepts persistent WebSocket connections, gives each one a session identity,
//! keeps a small piece of shared world state and rebroadcasts client events to
//! everyone connected.
//!
//! ## Core Responsibilities
//!
//! ### Session Identity
//! Every accepted connection receives a unique, never-reused session id. The id
//! is reported back in `hello` replies and stamped onto every message the
//! session causes to be broadcast.
//!
//! ### Shared World State
//! A single world instance holds:
//! - A monotonic tick clock started when the server boots
//! - The session id counter
//! - The beacon, one shared target coordinate any client may re-roll
//!
//! ### Broadcast Fan-Out
//! All sessions subscribe to one topic (`"events"`) on connect. Published
//! messages reach every subscriber, the sender included, in publish order per
//! subscriber.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! Each connection runs a reader task that routes inbound frames in receipt
//! order and a writer task that drains the session's outbound queue. All tasks
//! share the world, registry and hub through `Arc` handles on a multi-threaded
//! runtime.
//!
//! ### Isolated Delivery
//! Outbound queues are unbounded, so publishing never waits on a slow socket.
//! A closed connection fails only its own delivery.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Tick rate and beacon bounds, validated before the server binds.
//!
//! ### World Module (`world`)
//! The tick clock, the atomic session counter and the lock-guarded beacon.
//!
//! ### Session Module (`session`)
//! Session id assignment, hub subscription and release on disconnect.
//!
//! ### Hub Module (`hub`)
//! The subscriber set and best-effort fan-out.
//!
//! ### Router Module (`router`)
//! Dispatch of `hello`, `event` and `beacon` messages; everything else is logged
//! and ignored.
//!
//! ### Network Module (`network`)
//! TCP accept loop, WebSocket handshake and the per-connection tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::RelayConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 30 ticks per second, beacon inside an 800x600 field
//!     let server = Server::bind("127.0.0.1:8080", RelayConfig::new(30, 800, 600)).await?;
//!
//!     // Accept connections until Ctrl+C
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod hub;
pub mod network;
pub mod router;
pub mod session;
pub mod world;

//! Performance benchmarks for the relay's hot paths

use serde_json::{json, Map};
use server::config::RelayConfig;
use server::hub::BroadcastHub;
use server::world::WorldState;
use shared::{ClientMessage, ServerMessage, EVENTS_TOPIC};
use std::time::Instant;
use tokio::sync::mpsc;

/// Benchmarks session id assignment
#[test]
fn benchmark_session_ids() {
    let world = WorldState::new(RelayConfig::default()).unwrap();

    let iterations = 1_000_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = world.next_session_id();
    }

    let duration = start.elapsed();
    println!(
        "Session ids: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(world.next_session_id(), iterations + 1);
    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks beacon re-rolls
#[test]
fn benchmark_beacon_reroll() {
    let world = WorldState::new(RelayConfig::default()).unwrap();

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = world.reroll_beacon();
    }

    let duration = start.elapsed();
    println!(
        "Beacon reroll: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks decoding inbound event frames
#[test]
fn benchmark_event_decode() {
    let frame = json!({"type": "event", "payload": "fire", "x": 120, "y": 45}).to_string();

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let message = ClientMessage::decode(&frame).unwrap();
        assert_eq!(message.kind(), "event");
    }

    let duration = start.elapsed();
    println!(
        "Event decode: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks fan-out to many subscribers
#[tokio::test]
async fn benchmark_fanout() {
    let hub = BroadcastHub::new(EVENTS_TOPIC);
    let subscribers = 100;
    let mut receivers = Vec::with_capacity(subscribers);
    for id in 0..subscribers {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.subscribe(id as u64 + 1, tx).await;
        receivers.push(rx);
    }

    let mut fields = Map::new();
    fields.insert("payload".to_string(), json!("fire"));
    let message = ServerMessage::event(fields, 1);

    let publishes = 1_000;
    let start = Instant::now();

    for _ in 0..publishes {
        assert_eq!(hub.publish(&message).await, subscribers);
    }

    let duration = start.elapsed();
    println!(
        "Fan-out: {} publishes to {} subscribers in {:?} ({:.2} μs/publish)",
        publishes,
        subscribers,
        duration,
        duration.as_micros() as f64 / publishes as f64
    );

    for rx in &mut receivers {
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, publishes);
    }

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

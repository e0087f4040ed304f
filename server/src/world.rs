//! Shared world state: the tick clock, the session counter and the beacon.
//!
//! One [`WorldState`] is built at startup and handed to every connection task
//! behind an `Arc`. Its two mutable parts are safe for concurrent callers:
//! - The session counter is a single atomic, so ids are never handed out twice
//! - The beacon sits behind a lock and is replaced whole, so readers never see
//!   a coordinate that mixes an old `x` with a new `y`

use crate::config::RelayConfig;
use crate::error::ConfigError;
use log::debug;
use rand::Rng;
use shared::{Beacon, SessionId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

/// Monotonic tick clock anchored at a fixed epoch
///
/// Built on `Instant`, so wall-clock adjustments never move it backwards.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
    ms_per_tick: f64,
}

impl Clock {
    pub fn new(ticks_per_second: u32) -> Self {
        Self::starting_at(Instant::now(), ticks_per_second)
    }

    pub fn starting_at(epoch: Instant, ticks_per_second: u32) -> Self {
        Self {
            epoch,
            ms_per_tick: 1000.0 / ticks_per_second as f64,
        }
    }

    /// Ticks elapsed between the epoch and now
    pub fn ticks_elapsed(&self) -> f64 {
        self.ticks_at(Instant::now())
    }

    /// Ticks elapsed between the epoch and `now`, clamped at zero
    pub fn ticks_at(&self, now: Instant) -> f64 {
        let elapsed_ms = now.saturating_duration_since(self.epoch).as_secs_f64() * 1000.0;
        elapsed_ms / self.ms_per_tick
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    pub fn ms_per_tick(&self) -> f64 {
        self.ms_per_tick
    }
}

pub struct WorldState {
    config: RelayConfig,
    clock: Clock,
    session_counter: AtomicU64,
    beacon: RwLock<Beacon>,
}

impl WorldState {
    /// Validates `config` and starts the clock
    ///
    /// The beacon starts at a random position inside the configured bounds.
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let beacon = random_beacon(config.width, config.height);
        debug!("World initialised with beacon at ({}, {})", beacon.x, beacon.y);

        Ok(Self {
            config,
            clock: Clock::new(config.ticks_per_second),
            session_counter: AtomicU64::new(0),
            beacon: RwLock::new(beacon),
        })
    }

    pub fn ticks_elapsed(&self) -> f64 {
        self.clock.ticks_elapsed()
    }

    /// Hands out the next session id; the first id is 1
    pub fn next_session_id(&self) -> SessionId {
        self.session_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_beacon(&self) -> Beacon {
        *self.beacon.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the beacon to a fresh uniform draw and returns the new position
    pub fn reroll_beacon(&self) -> Beacon {
        let next = random_beacon(self.config.width, self.config.height);
        *self.beacon.write().unwrap_or_else(PoisonError::into_inner) = next;
        next
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.config.ticks_per_second
    }
}

fn random_beacon(width: u32, height: u32) -> Beacon {
    let mut rng = rand::thread_rng();
    Beacon::new(rng.gen_range(0..width), rng.gen_range(0..height))
}

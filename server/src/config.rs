//! Process-wide relay settings, fixed at startup.

use crate::error::ConfigError;
use shared::{DEFAULT_TICKS_PER_SECOND, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};

/// Tick rate and beacon bounds shared by every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Clock resolution reported to clients in `hello` replies
    pub ticks_per_second: u32,
    /// Exclusive upper bound of the beacon x coordinate
    pub width: u32,
    /// Exclusive upper bound of the beacon y coordinate
    pub height: u32,
}

impl RelayConfig {
    pub fn new(ticks_per_second: u32, width: u32, height: u32) -> Self {
        Self {
            ticks_per_second,
            width,
            height,
        }
    }

    /// Rejects settings the relay cannot run with
    ///
    /// A zero tick rate would divide by zero in the clock and a zero-area
    /// world leaves no valid beacon position.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_second == 0 {
            return Err(ConfigError::InvalidTickRate(self.ticks_per_second));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyWorld {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn ms_per_tick(&self) -> f64 {
        1000.0 / self.ticks_per_second as f64
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_TICKS_PER_SECOND,
            DEFAULT_WORLD_WIDTH,
            DEFAULT_WORLD_HEIGHT,
        )
    }
}

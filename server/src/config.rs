//! Server configuration.

use pool::PoolConfig;

use crate::bandwidth::FrameBudget;
use crate::error::{ServerError, ServerResult};

/// What the encoder does with a delta it cannot encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidDeltaPolicy {
    /// Abort: the delta producer has a bug.
    Panic,
    /// Log, drop the delta and keep encoding the frame.
    Drop,
}

impl Default for InvalidDeltaPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::Drop
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerConfig {
    /// Ticks between two frames to the same client.
    pub frame_interval: u64,
    /// Networked game. Without one, only recording clients get frames.
    pub net_game: bool,
    pub budget: FrameBudget,
    pub pool: PoolConfig,
    pub invalid_delta_policy: InvalidDeltaPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            frame_interval: 1,
            net_game: true,
            budget: FrameBudget::default(),
            pool: PoolConfig::default(),
            invalid_delta_policy: InvalidDeltaPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Small budgets and fixed resend timeouts; invalid deltas are dropped.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            frame_interval: 1,
            net_game: true,
            budget: FrameBudget::for_testing(),
            pool: PoolConfig::for_testing(),
            invalid_delta_policy: InvalidDeltaPolicy::Drop,
        }
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.frame_interval == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "frame interval must be at least 1",
            });
        }
        if self.budget.min_frame_bytes <= wire::FRAME_HEADER_SIZE {
            return Err(ServerError::InvalidConfig {
                reason: "minimum frame size must exceed the frame header",
            });
        }
        if self.budget.max_first_frame_bytes < self.budget.min_frame_bytes {
            return Err(ServerError::InvalidConfig {
                reason: "first frame cap is below the minimum frame size",
            });
        }
        if self.pool.min_resend_ms > self.pool.max_resend_ms {
            return Err(ServerError::InvalidConfig {
                reason: "minimum resend timeout exceeds the maximum",
            });
        }
        if !(0.0..=1.0).contains(&self.pool.ack_smoothing) {
            return Err(ServerError::InvalidConfig {
                reason: "ack smoothing must be within 0..=1",
            });
        }
        Ok(())
    }
}

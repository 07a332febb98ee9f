//! Smoothed acknowledgment time and the resend timeout derived from it.

use crate::config::PoolConfig;

/// Exponential moving average of how long acknowledgments take.
#[derive(Debug, Clone, PartialEq)]
pub struct AckTimer {
    smoothed_ms: f32,
    samples: u64,
}

impl AckTimer {
    #[must_use]
    pub fn new(config: &PoolConfig) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let smoothed_ms = config.initial_ack_ms as f32;
        Self {
            smoothed_ms,
            samples: 0,
        }
    }

    /// Feeds one round-trip sample.
    pub fn record(&mut self, config: &PoolConfig, sample_ms: u64) {
        #[allow(clippy::cast_precision_loss)]
        let sample = sample_ms as f32;
        if self.samples == 0 {
            self.smoothed_ms = sample;
        } else {
            let alpha = config.ack_smoothing.clamp(0.0, 1.0);
            self.smoothed_ms += (sample - self.smoothed_ms) * alpha;
        }
        self.samples += 1;
    }

    #[must_use]
    pub fn smoothed_ms(&self) -> f32 {
        self.smoothed_ms
    }

    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Time after which an unacknowledged delta is resent.
    #[must_use]
    pub fn resend_timeout_ms(&self, config: &PoolConfig) -> u64 {
        let scaled = (self.smoothed_ms * config.resend_factor).max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = scaled.ceil() as u64;
        scaled
            .max(config.min_resend_ms)
            .min(config.max_resend_ms.max(config.min_resend_ms))
    }
}

//! Pool configuration.

/// Retransmission tuning for one client's pool.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Lower bound of the retransmission timeout.
    pub min_resend_ms: u64,
    /// Upper bound of the retransmission timeout.
    pub max_resend_ms: u64,
    /// Timeout as a multiple of the smoothed acknowledgment time.
    pub resend_factor: f32,
    /// Acknowledgment time assumed before the first sample arrives.
    pub initial_ack_ms: u64,
    /// Weight of a new sample in the moving average, `0.0..=1.0`.
    pub ack_smoothing: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_resend_ms: 200,
            max_resend_ms: 5_000,
            resend_factor: 2.0,
            initial_ack_ms: 250,
            ack_smoothing: 0.125,
        }
    }
}

impl PoolConfig {
    /// Small, fixed timeouts for deterministic tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            min_resend_ms: 100,
            max_resend_ms: 100,
            resend_factor: 1.0,
            initial_ack_ms: 100,
            ack_smoothing: 0.5,
        }
    }
}

//! Decides which clients get a frame on a given tick.

use tracing::trace;

/// Per-tick frame staggering.
///
/// Each frame target has an ordinal among the in-game clients. Its due tick is
/// offset by `ordinal * interval / targets`, so with an interval above one
/// the clients' frames fall on different ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameScheduler {
    last_tick: Option<u64>,
}

impl FrameScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self { last_tick: None }
    }

    /// Marks `tick` as processed. Returns `false` if it already was.
    pub fn begin_tick(&mut self, tick: u64) -> bool {
        if self.last_tick == Some(tick) {
            trace!(tick, "tick already processed");
            return false;
        }
        self.last_tick = Some(tick);
        true
    }

    #[must_use]
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Staggered due tick of the client with `ordinal` among `targets`.
    #[must_use]
    pub const fn due_tick(tick: u64, ordinal: u64, targets: u64, interval: u64) -> u64 {
        let targets = if targets == 0 { 1 } else { targets };
        tick + ordinal * interval / targets
    }

    /// Whether a client last served at `last_transmit` is due at `tick`.
    ///
    /// A client is due once its staggered due tick has reached a later frame
    /// slot than its last transmission.
    #[must_use]
    pub const fn is_due(
        tick: u64,
        last_transmit: Option<u64>,
        ordinal: u64,
        targets: u64,
        interval: u64,
    ) -> bool {
        let Some(last) = last_transmit else {
            return true;
        };
        let interval = if interval == 0 { 1 } else { interval };
        let due = Self::due_tick(tick, ordinal, targets, interval);
        let last_due = Self::due_tick(last, ordinal, targets, interval);
        due / interval > last_due / interval
    }
}

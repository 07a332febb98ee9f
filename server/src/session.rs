//! Per-client session state.

use std::fmt;

use pool::{DeltaPool, PoolConfig};

/// Client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Running totals for one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionStats {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub deltas_sent: u64,
    pub deltas_dropped: u64,
    pub backpressure_skips: u64,
}

/// Everything the server tracks for one connected client.
///
/// The pool is owned by the session; nothing else mutates it.
#[derive(Debug, Clone)]
pub struct ClientSession {
    id: ClientId,
    pub(crate) pool: DeltaPool,
    pub(crate) last_transmit: Option<u64>,
    pub(crate) ready: bool,
    pub(crate) in_game: bool,
    pub(crate) recording: bool,
    pub(crate) local: bool,
    pub(crate) needs_baseline: bool,
    pub(crate) stats: SessionStats,
}

impl ClientSession {
    #[must_use]
    pub fn new(id: ClientId, pool: PoolConfig) -> Self {
        Self {
            id,
            pool: DeltaPool::new(pool),
            last_transmit: None,
            ready: false,
            in_game: false,
            recording: false,
            local: false,
            needs_baseline: true,
            stats: SessionStats::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    #[must_use]
    pub const fn pool(&self) -> &DeltaPool {
        &self.pool
    }

    /// Tick of the last frame sent.
    #[must_use]
    pub const fn last_transmit(&self) -> Option<u64> {
        self.last_transmit
    }

    /// Handshake finished.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub const fn is_in_game(&self) -> bool {
        self.in_game
    }

    /// Receives frames for a demo recording.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recording
    }

    /// Loopback client: frames are acknowledged as soon as they are sent.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.local
    }

    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Ready, and either playing or recording.
    #[must_use]
    pub const fn is_frame_target(&self) -> bool {
        self.ready && (self.in_game || self.recording)
    }

    pub(crate) fn reset_for_map_change(&mut self) {
        self.pool.reset_for_map_change();
        self.needs_baseline = true;
    }
}

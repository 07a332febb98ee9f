//! Collaborators the frame server drives: transport, clock and world.

use model::Delta;
use wire::Channel;

use crate::bandwidth::BandwidthRating;
use crate::session::ClientId;

/// Game tics per second used to derive the frame's game time.
pub const TIC_RATE: u32 = 35;

/// Per-client outbound queue.
pub trait Transport {
    /// Whether the client's send queue can take another frame.
    ///
    /// Implementations may update the client's rating here.
    fn can_send_now(&mut self, client: ClientId) -> bool;

    /// Enqueues a finished frame. Must not block.
    fn send(&mut self, client: ClientId, frame: Vec<u8>, channel: Channel);

    fn bandwidth_rating(&self, client: ClientId) -> BandwidthRating;
}

/// Simulation time source.
pub trait Clock {
    fn current_tick(&self) -> u64;

    /// Wall time in milliseconds, used for resend timeouts.
    fn now_ms(&self) -> u64;

    /// Game time written into frame headers, in seconds.
    #[allow(clippy::cast_precision_loss)]
    fn game_time(&self) -> f32 {
        self.current_tick() as f32 / TIC_RATE as f32
    }
}

/// Authoritative world state, seen as deltas.
pub trait WorldSnapshot {
    /// Visits one delta per entity that changed during `tick`.
    fn for_each_changed_entity(&mut self, tick: u64, visit: &mut dyn FnMut(Delta));

    /// Visits a full-state delta for every live entity.
    ///
    /// Used to rebuild a client's baseline after a join or a map change. The
    /// default visits nothing.
    fn for_each_live_entity(&mut self, visit: &mut dyn FnMut(Delta)) {
        let _ = visit;
    }
}

//! Writes one bounded frame for one client from its pool.

use bytestream::ByteWriter;
use codec::encode_record;
use tracing::{debug, trace, warn};
use wire::{encode_frame_header, Channel, FrameHeader, FrameKind};

use crate::config::{InvalidDeltaPolicy, ServerConfig};
use crate::session::ClientSession;
use crate::transport::Transport;

/// What one frame contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameStats {
    pub set: u8,
    pub kind: FrameKind,
    pub channel: Channel,
    /// Encoded size, header included.
    pub bytes: usize,
    pub budget: usize,
    /// Records written.
    pub deltas: usize,
    /// Invalid deltas discarded under [`InvalidDeltaPolicy::Drop`].
    pub dropped: usize,
    /// Size of the first record, which is written even when it alone
    /// exceeds the budget.
    pub first_record_bytes: usize,
}

impl FrameStats {
    /// Whether the frame exceeded its budget beyond the allowed first record.
    #[must_use]
    pub fn within_budget(&self) -> bool {
        self.bytes <= self.budget.max(wire::FRAME_HEADER_SIZE + self.first_record_bytes)
    }
}

/// Result of asking for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The client's send queue is full. Nothing changed.
    Backpressure,
    Sent(FrameStats),
}

impl FrameOutcome {
    #[must_use]
    pub const fn stats(&self) -> Option<&FrameStats> {
        match self {
            Self::Sent(stats) => Some(stats),
            Self::Backpressure => None,
        }
    }
}

/// Builds and hands one frame to the transport.
///
/// Records are written in pool priority order until the budget is reached.
/// A record that would overflow the budget is rolled back and stays queued,
/// unless it is the first record of the frame.
pub(crate) fn send_frame<T>(
    session: &mut ClientSession,
    transport: &mut T,
    config: &ServerConfig,
    now_ms: u64,
    game_time: f32,
) -> FrameOutcome
where
    T: Transport + ?Sized,
{
    let client = session.id();
    if !transport.can_send_now(client) {
        trace!(%client, "send queue full, skipping frame");
        session.stats.backpressure_skips += 1;
        return FrameOutcome::Backpressure;
    }

    let local = session.local;
    let pool = &mut session.pool;
    pool.rate(now_ms);
    let set = pool.next_set();
    let first = pool.is_first();
    let budget = config
        .budget
        .for_frame(first, transport.bandwidth_rating(client));
    let header = if first {
        FrameHeader::first(game_time, set)
    } else {
        FrameHeader::regular(game_time, set)
    };

    let mut writer = ByteWriter::with_capacity(budget.min(config.budget.max_datagram_bytes));
    encode_frame_header(&header, &mut writer);

    let mut deltas = 0;
    let mut dropped = 0;
    let mut first_record_bytes = 0;
    let mut local_resends = Vec::new();
    while writer.len() < budget {
        let Some(handle) = pool.extract_next() else {
            break;
        };
        let Some(entry) = pool.get(handle) else {
            continue;
        };

        let start = writer.len();
        let resent = entry.resend_tag();
        match encode_record(entry.delta(), resent, &mut writer) {
            Ok(written) => {
                if writer.len() > budget && deltas > 0 {
                    writer.truncate(start);
                    break;
                }
                if deltas == 0 {
                    first_record_bytes = written;
                }
                pool.commit(handle, set, now_ms);
                deltas += 1;
                if let Some(tag) = resent.filter(|_| local) {
                    local_resends.push(tag);
                }
            }
            Err(err) => match config.invalid_delta_policy {
                InvalidDeltaPolicy::Panic => {
                    panic!("invalid delta for client {client}: {err}")
                }
                InvalidDeltaPolicy::Drop => {
                    warn!(%client, %err, "dropping invalid delta");
                    writer.truncate(start);
                    pool.discard(handle);
                    dropped += 1;
                }
            },
        }
    }

    let bytes = writer.finish();
    let stats = FrameStats {
        set,
        kind: header.kind,
        channel: header.kind.channel(),
        bytes: bytes.len(),
        budget,
        deltas,
        dropped,
        first_record_bytes,
    };
    transport.send(client, bytes, stats.channel);
    debug!(
        %client,
        set,
        bytes = stats.bytes,
        budget,
        deltas,
        channel = ?stats.channel,
        "frame sent"
    );

    // Retransmissions keep their first set, so a local client acks them by tag.
    if local {
        session.pool.acknowledge(set, 0, now_ms);
        for tag in local_resends {
            session.pool.acknowledge(tag.set, tag.resend.get(), now_ms);
        }
    }
    session.pool.clear_first();

    session.stats.frames_sent += 1;
    session.stats.bytes_sent += stats.bytes as u64;
    session.stats.deltas_sent += deltas as u64;
    session.stats.deltas_dropped += dropped as u64;
    FrameOutcome::Sent(stats)
}

#[cfg(test)]
mod tests {
    use model::{Delta, MobjDelta};
    use pool::PoolConfig;

    use super::*;
    use crate::bandwidth::BandwidthRating;
    use crate::session::ClientId;

    #[derive(Default)]
    struct Sink {
        full: bool,
        sent: Vec<(Vec<u8>, Channel)>,
    }

    impl Transport for Sink {
        fn can_send_now(&mut self, _client: ClientId) -> bool {
            !self.full
        }

        fn send(&mut self, _client: ClientId, frame: Vec<u8>, channel: Channel) {
            self.sent.push((frame, channel));
        }

        fn bandwidth_rating(&self, _client: ClientId) -> BandwidthRating {
            BandwidthRating::MIN
        }
    }

    fn session() -> ClientSession {
        ClientSession::new(ClientId(1), PoolConfig::for_testing())
    }

    #[test]
    fn backpressure_changes_nothing() {
        let mut session = session();
        session
            .pool
            .insert_or_merge(Delta::mobj(1u32, MobjDelta::new().with_health(5)), 0);
        let mut sink = Sink {
            full: true,
            ..Sink::default()
        };

        let outcome = send_frame(&mut session, &mut sink, &ServerConfig::for_testing(), 0, 0.0);
        assert_eq!(outcome, FrameOutcome::Backpressure);
        assert!(sink.sent.is_empty());
        assert!(session.pool().is_first());
        assert_eq!(session.pool().queued_count(), 1);
    }

    #[test]
    fn first_frame_goes_ordered_then_unordered() {
        let mut session = session();
        let mut sink = Sink::default();
        let config = ServerConfig::for_testing();

        let first = send_frame(&mut session, &mut sink, &config, 0, 0.0);
        let second = send_frame(&mut session, &mut sink, &config, 1, 0.0);
        assert_eq!(first.stats().unwrap().kind, FrameKind::First);
        assert_eq!(sink.sent[0].1, Channel::Ordered);
        assert_eq!(second.stats().unwrap().kind, FrameKind::Regular);
        assert_eq!(sink.sent[1].1, Channel::Unordered);
    }

    #[test]
    fn empty_frame_is_still_sent() {
        let mut session = session();
        let mut sink = Sink::default();
        let outcome = send_frame(&mut session, &mut sink, &ServerConfig::for_testing(), 0, 1.5);
        let stats = outcome.stats().unwrap();
        assert_eq!(stats.deltas, 0);
        assert_eq!(stats.bytes, wire::FRAME_HEADER_SIZE);
    }

    #[test]
    fn invalid_delta_is_dropped() {
        let mut session = session();
        session
            .pool
            .insert_or_merge(Delta::mobj(70_000u32, MobjDelta::new().with_health(5)), 0);
        session
            .pool
            .insert_or_merge(Delta::mobj(2u32, MobjDelta::new().with_health(5)), 0);
        let mut sink = Sink::default();

        let outcome = send_frame(&mut session, &mut sink, &ServerConfig::for_testing(), 0, 0.0);
        let stats = outcome.stats().unwrap();
        assert_eq!(stats.deltas, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(session.pool().pending_count(), 1);
    }

    #[test]
    #[should_panic(expected = "invalid delta")]
    fn invalid_delta_panics_under_panic_policy() {
        let mut session = session();
        session
            .pool
            .insert_or_merge(Delta::player(300u32, model::PlayerDelta::new().with_mobj(1)), 0);
        let config = ServerConfig {
            invalid_delta_policy: InvalidDeltaPolicy::Panic,
            ..ServerConfig::for_testing()
        };
        let _ = send_frame(&mut session, &mut Sink::default(), &config, 0, 0.0);
    }

    #[test]
    fn local_client_is_acknowledged_immediately() {
        let mut session = session();
        session.local = true;
        session
            .pool
            .insert_or_merge(Delta::mobj(1u32, MobjDelta::new().with_health(5)), 0);
        send_frame(&mut session, &mut Sink::default(), &ServerConfig::for_testing(), 0, 0.0);
        assert_eq!(session.pool().pending_count(), 0);
    }
}

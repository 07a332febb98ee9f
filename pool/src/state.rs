//! Per-delta transmission state and priority classes.

use std::num::NonZeroU8;

use model::{Delta, DeltaBody};
use wire::ResendTag;

/// Where a delta is in its send/acknowledge cycle.
///
/// ```text
/// New --commit--> Unacked --timeout--> Resend --commit--> Unacked ...
///                    |                   |
///                    +------- ack -------+--> removed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeltaState {
    /// Never transmitted. Still mergeable.
    New,
    /// Transmitted and awaiting acknowledgment.
    Unacked {
        /// Set the delta was first sent in.
        set: u8,
        /// Present once the delta has been retransmitted.
        resend: Option<NonZeroU8>,
        /// When it was last transmitted.
        sent_at: u64,
    },
    /// Timed out; queued for retransmission under `resend`.
    Resend { set: u8, resend: NonZeroU8 },
}

impl DeltaState {
    /// State after the delta was written into a frame with set `frame_set`.
    ///
    /// Retransmissions keep the set of their first transmission.
    #[must_use]
    pub const fn committed(self, frame_set: u8, now_ms: u64) -> Self {
        match self {
            Self::New => Self::Unacked {
                set: frame_set,
                resend: None,
                sent_at: now_ms,
            },
            Self::Resend { set, resend } => Self::Unacked {
                set,
                resend: Some(resend),
                sent_at: now_ms,
            },
            Self::Unacked { set, resend, .. } => Self::Unacked {
                set,
                resend,
                sent_at: now_ms,
            },
        }
    }

    /// State after the acknowledgment timeout expired.
    ///
    /// Only unacknowledged deltas time out; any other state is returned as is.
    #[must_use]
    pub const fn timed_out(self, resend: NonZeroU8) -> Self {
        match self {
            Self::Unacked { set, .. } => Self::Resend { set, resend },
            other => other,
        }
    }

    /// Transmitted at least once and not yet acknowledged.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        !matches!(self, Self::New)
    }

    /// Eligible for the next frame.
    #[must_use]
    pub const fn is_queued(self) -> bool {
        matches!(self, Self::New | Self::Resend { .. })
    }

    /// Set of the first transmission, if any.
    #[must_use]
    pub const fn set(self) -> Option<u8> {
        match self {
            Self::New => None,
            Self::Unacked { set, .. } | Self::Resend { set, .. } => Some(set),
        }
    }

    /// Resend id, once one has been dealt.
    #[must_use]
    pub const fn resend(self) -> Option<NonZeroU8> {
        match self {
            Self::New | Self::Unacked { resend: None, .. } => None,
            Self::Unacked {
                resend: Some(resend),
                ..
            }
            | Self::Resend { resend, .. } => Some(resend),
        }
    }

    /// Tag written in front of the record, present only for retransmissions.
    #[must_use]
    pub const fn resend_tag(self) -> Option<ResendTag> {
        match self {
            Self::Resend { set, resend } => Some(ResendTag { set, resend }),
            Self::New | Self::Unacked { .. } => None,
        }
    }
}

/// Coarse send priority, highest last so the derived order sorts naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriorityClass {
    /// Fire-and-forget sound events.
    Sound,
    /// Sectors, sides and polyobjects.
    World,
    /// Mobjs and mobj removals.
    Mobj,
    Player,
    /// Timed-out deltas being retransmitted.
    Resend,
}

impl PriorityClass {
    #[must_use]
    pub const fn of(delta: &Delta, state: DeltaState) -> Self {
        if matches!(state, DeltaState::Resend { .. }) {
            return Self::Resend;
        }
        match delta.body {
            DeltaBody::Player(_) => Self::Player,
            DeltaBody::Mobj(_) | DeltaBody::NullMobj => Self::Mobj,
            DeltaBody::Sector(_) | DeltaBody::Side(_) | DeltaBody::Poly(_) => Self::World,
            DeltaBody::Sound(_) => Self::Sound,
        }
    }
}

//! Client-side frame reception: duplicate filtering and acknowledgments.

use std::num::{NonZeroU8, NonZeroUsize};

use model::Delta;
use wire::{FrameHeader, FrameKind, Limits, ResendTag};

use crate::error::CodecResult;
use crate::frame::decode_frame;

/// Acknowledgments a client owes the server for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AckReport {
    /// Set number of the received frame.
    pub set: u8,
    /// Every resent record in the frame, duplicates included.
    pub resends: Vec<ResendTag>,
}

impl AckReport {
    /// `(set, resend)` pairs in the form the server's ack hook takes.
    ///
    /// The first pair acknowledges the frame's own set with resend id 0.
    pub fn acks(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        std::iter::once((self.set, 0)).chain(
            self.resends
                .iter()
                .map(|tag| (tag.set, tag.resend.get())),
        )
    }
}

/// Result of receiving one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFrame {
    pub header: FrameHeader,
    /// Deltas to apply, in frame order.
    pub deltas: Vec<Delta>,
    /// Records discarded because their content was already delivered.
    pub duplicates: usize,
    pub ack: AckReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seen {
    set: u8,
    resend: Option<NonZeroU8>,
}

/// A fixed-capacity ring buffer of recently delivered sets and resend tags.
///
/// The window must stay well below 256 sets so a wrapped set number is not
/// mistaken for an old one.
#[derive(Debug)]
pub struct ReceiveHistory {
    entries: Vec<Option<Seen>>,
    head: usize,
    len: usize,
}

impl ReceiveHistory {
    /// Creates an empty history with the given capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        let mut entries = Vec::with_capacity(cap);
        entries.resize_with(cap, || None);
        Self {
            entries,
            head: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
        self.head = 0;
        self.len = 0;
    }

    /// Returns `true` if the whole set was delivered.
    #[must_use]
    pub fn contains_set(&self, set: u8) -> bool {
        self.contains(Seen { set, resend: None })
    }

    /// Returns `true` if the tagged record was already delivered, either in
    /// its original set or in an earlier retransmission.
    #[must_use]
    pub fn contains_resend(&self, tag: ResendTag) -> bool {
        self.contains_set(tag.set)
            || self.contains(Seen {
                set: tag.set,
                resend: Some(tag.resend),
            })
    }

    pub fn record_set(&mut self, set: u8) {
        self.push(Seen { set, resend: None });
    }

    pub fn record_resend(&mut self, tag: ResendTag) {
        self.push(Seen {
            set: tag.set,
            resend: Some(tag.resend),
        });
    }

    fn contains(&self, seen: Seen) -> bool {
        self.iter().any(|entry| entry == seen)
    }

    fn push(&mut self, seen: Seen) {
        let cap = self.entries.len();
        if self.len < cap {
            let idx = (self.head + self.len) % cap;
            self.entries[idx] = Some(seen);
            self.len += 1;
        } else {
            self.entries[self.head] = Some(seen);
            self.head = (self.head + 1) % cap;
        }
    }

    fn iter(&self) -> impl Iterator<Item = Seen> + '_ {
        let cap = self.entries.len();
        (0..self.len).filter_map(move |i| self.entries[(self.head + i) % cap])
    }
}

/// Default number of history entries kept by a [`FrameReceiver`].
pub const DEFAULT_HISTORY: usize = 64;

/// Decodes frames for one client and filters duplicate deliveries.
#[derive(Debug)]
pub struct FrameReceiver {
    history: ReceiveHistory,
    limits: Limits,
}

impl FrameReceiver {
    #[must_use]
    pub fn new(history: NonZeroUsize, limits: Limits) -> Self {
        Self {
            history: ReceiveHistory::new(history),
            limits,
        }
    }

    #[must_use]
    pub fn history(&self) -> &ReceiveHistory {
        &self.history
    }

    /// Decodes one frame.
    ///
    /// A first frame starts a new baseline and forgets the history. A frame
    /// whose set was already delivered contributes only the resent records
    /// not yet seen. The ack report always covers the whole frame.
    pub fn receive(&mut self, bytes: &[u8]) -> CodecResult<ReceivedFrame> {
        let frame = decode_frame(bytes, &self.limits)?;
        if frame.header.kind == FrameKind::First {
            self.history.clear();
        }

        let set = frame.header.set;
        let set_seen = self.history.contains_set(set);
        let mut deltas = Vec::with_capacity(frame.records.len());
        let mut resends = Vec::new();
        let mut fresh_resends = Vec::new();
        let mut duplicates = 0;

        for record in frame.records {
            let duplicate = match record.resent {
                Some(tag) => {
                    resends.push(tag);
                    let seen = self.history.contains_resend(tag);
                    if !seen {
                        fresh_resends.push(tag);
                    }
                    seen
                }
                None => set_seen,
            };
            if duplicate {
                duplicates += 1;
            } else {
                deltas.push(record.delta);
            }
        }

        if !set_seen {
            self.history.record_set(set);
        }
        for tag in fresh_resends {
            self.history.record_resend(tag);
        }

        Ok(ReceivedFrame {
            header: frame.header,
            deltas,
            duplicates,
            ack: AckReport { set, resends },
        })
    }
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(DEFAULT_HISTORY).unwrap_or(NonZeroUsize::MIN),
            Limits::default(),
        )
    }
}

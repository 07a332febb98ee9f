//! The per-client delta pool.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::num::NonZeroU8;

use model::{Delta, DeltaKey};
use tracing::{debug, trace};
use wire::ResendTag;

use crate::ack_timer::AckTimer;
use crate::config::PoolConfig;
use crate::state::{DeltaState, PriorityClass};

/// Stable reference to one pool entry.
///
/// Handles are never reused, so a handle to a removed entry simply stops
/// resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeltaHandle(u64);

impl DeltaHandle {
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0
    }
}

/// A delta together with its transmission bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    delta: Delta,
    state: DeltaState,
    created_at: u64,
    seq: u64,
}

impl PoolEntry {
    #[must_use]
    pub const fn delta(&self) -> &Delta {
        &self.delta
    }

    #[must_use]
    pub const fn state(&self) -> DeltaState {
        self.state
    }

    /// Tag to write in front of the record, if this is a retransmission.
    #[must_use]
    pub const fn resend_tag(&self) -> Option<ResendTag> {
        self.state.resend_tag()
    }

    #[must_use]
    pub const fn priority(&self) -> PriorityClass {
        PriorityClass::of(&self.delta, self.state)
    }

    /// Time the delta first entered the pool.
    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    #[must_use]
    pub const fn handle(&self) -> DeltaHandle {
        DeltaHandle(self.seq)
    }
}

/// Pending and in-flight deltas for one client.
///
/// At most one `New` delta exists per [`DeltaKey`]; later changes merge into
/// it. Deltas already on the wire stay in the pool until acknowledged.
#[derive(Debug, Clone)]
pub struct DeltaPool {
    config: PoolConfig,
    entries: BTreeMap<u64, PoolEntry>,
    /// The one `New` entry per key.
    pending: HashMap<DeltaKey, u64>,
    /// Every entry per key, `New` and in flight.
    by_key: HashMap<DeltaKey, Vec<u64>>,
    queue: VecDeque<u64>,
    next_seq: u64,
    next_set: u8,
    next_resend: u8,
    held_resends: [bool; 256],
    is_first: bool,
    timer: AckTimer,
}

impl Default for DeltaPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl DeltaPool {
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let timer = AckTimer::new(&config);
        Self {
            config,
            entries: BTreeMap::new(),
            pending: HashMap::new(),
            by_key: HashMap::new(),
            queue: VecDeque::new(),
            next_seq: 0,
            next_set: 0,
            next_resend: 1,
            held_resends: [false; 256],
            is_first: true,
            timer,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub const fn ack_timer(&self) -> &AckTimer {
        &self.timer
    }

    /// Whether the next frame is the client's first since joining or the last
    /// map change.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.is_first
    }

    pub fn clear_first(&mut self) {
        self.is_first = false;
    }

    /// Deals the set number for the next frame.
    pub fn next_set(&mut self) -> u8 {
        let set = self.next_set;
        self.next_set = self.next_set.wrapping_add(1);
        set
    }

    /// All entries, queued or in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries eligible for the next frame.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state.is_queued())
            .count()
    }

    /// Entries sent and not yet acknowledged.
    #[must_use]
    pub fn unacked_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state.is_in_flight())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, handle: DeltaHandle) -> Option<&PoolEntry> {
        self.entries.get(&handle.0)
    }

    /// The never-sent delta for `key`, if any.
    #[must_use]
    pub fn pending_for(&self, key: DeltaKey) -> Option<&PoolEntry> {
        self.pending.get(&key).and_then(|seq| self.entries.get(seq))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.values()
    }

    /// Adds a change, merging it into the never-sent delta for the same key.
    ///
    /// In-flight deltas for the key lose the fields `delta` supersedes and are
    /// dropped once nothing is left to retransmit. Returns `None` for an
    /// empty delta, which is ignored.
    pub fn insert_or_merge(&mut self, delta: Delta, now_ms: u64) -> Option<DeltaHandle> {
        let key = delta.key();
        if delta.is_empty() {
            trace!(%key, "ignoring empty delta");
            return None;
        }

        if !delta.is_sound() {
            self.subtract_in_flight(&delta);
        }

        if let Some(&seq) = self.pending.get(&key) {
            if let Some(entry) = self.entries.get_mut(&seq) {
                entry.delta.merge_from(delta);
                trace!(%key, seq, "merged into pending delta");
                return Some(DeltaHandle(seq));
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            seq,
            PoolEntry {
                delta,
                state: DeltaState::New,
                created_at: now_ms,
                seq,
            },
        );
        self.pending.insert(key, seq);
        self.by_key.entry(key).or_default().push(seq);
        Some(DeltaHandle(seq))
    }

    fn subtract_in_flight(&mut self, newer: &Delta) {
        let key = newer.key();
        let Some(seqs) = self.by_key.get(&key) else {
            return;
        };
        let mut obsolete = Vec::new();
        for &seq in seqs {
            let Some(entry) = self.entries.get_mut(&seq) else {
                continue;
            };
            if !entry.state.is_in_flight() {
                continue;
            }
            if newer.is_null() || entry.delta.subtract(newer) {
                obsolete.push(seq);
            }
        }
        for seq in obsolete {
            trace!(%key, seq, "dropping superseded in-flight delta");
            self.remove(seq);
        }
    }

    /// Refreshes timeouts and the send order.
    ///
    /// Unacknowledged deltas older than the resend timeout move to `Resend`,
    /// except sounds, which are dropped. The queue is rebuilt in priority
    /// order, oldest first within a class.
    pub fn rate(&mut self, now_ms: u64) {
        let timeout = self.timer.resend_timeout_ms(&self.config);
        let expired: Vec<u64> = self
            .entries
            .iter()
            .filter_map(|(&seq, entry)| match entry.state {
                DeltaState::Unacked { sent_at, .. }
                    if now_ms.saturating_sub(sent_at) >= timeout =>
                {
                    Some(seq)
                }
                _ => None,
            })
            .collect();

        for seq in expired {
            self.expire(seq);
        }

        let mut ready: Vec<(Reverse<PriorityClass>, u64, u64)> = self
            .entries
            .values()
            .filter(|entry| entry.state.is_queued())
            .map(|entry| (Reverse(entry.priority()), entry.created_at, entry.seq))
            .collect();
        ready.sort_unstable();
        self.queue = ready.into_iter().map(|(_, _, seq)| seq).collect();
    }

    fn expire(&mut self, seq: u64) {
        let Some(entry) = self.entries.get(&seq) else {
            return;
        };
        let key = entry.delta.key();
        if entry.delta.is_sound() {
            trace!(%key, seq, "sound timed out, dropping");
            self.remove(seq);
            return;
        }
        let resend = match entry.state.resend() {
            Some(resend) => resend,
            None => match self.deal_resend() {
                Some(resend) => resend,
                None => {
                    debug!(%key, seq, "no free resend id, retrying later");
                    return;
                }
            },
        };
        if let Some(entry) = self.entries.get_mut(&seq) {
            entry.state = entry.state.timed_out(resend);
            debug!(%key, seq, resend = resend.get(), set = ?entry.state.set(), "queued for resend");
        }
    }

    fn deal_resend(&mut self) -> Option<NonZeroU8> {
        for _ in 0..u8::MAX {
            let candidate = self.next_resend;
            self.next_resend = match self.next_resend.wrapping_add(1) {
                0 => 1,
                next => next,
            };
            if let Some(id) = NonZeroU8::new(candidate) {
                if !self.held_resends[usize::from(candidate)] {
                    self.held_resends[usize::from(candidate)] = true;
                    return Some(id);
                }
            }
        }
        None
    }

    /// Next delta to write, highest priority first.
    ///
    /// Extraction does not change the delta's state: call [`Self::commit`]
    /// once it is actually in the frame.
    pub fn extract_next(&mut self) -> Option<DeltaHandle> {
        while let Some(seq) = self.queue.pop_front() {
            if self
                .entries
                .get(&seq)
                .is_some_and(|entry| entry.state.is_queued())
            {
                return Some(DeltaHandle(seq));
            }
        }
        None
    }

    /// Records that the delta was written into the frame with set `set`.
    ///
    /// Returns `false` if the handle no longer resolves.
    pub fn commit(&mut self, handle: DeltaHandle, set: u8, now_ms: u64) -> bool {
        let Some(entry) = self.entries.get_mut(&handle.0) else {
            return false;
        };
        if entry.state == DeltaState::New {
            let key = entry.delta.key();
            if self.pending.get(&key) == Some(&handle.0) {
                self.pending.remove(&key);
            }
        }
        entry.state = entry.state.committed(set, now_ms);
        true
    }

    /// Removes an entry without sending it.
    pub fn discard(&mut self, handle: DeltaHandle) -> Option<Delta> {
        self.remove(handle.0).map(|entry| entry.delta)
    }

    /// Applies an acknowledgment and returns how many deltas it retired.
    ///
    /// `resend == 0` acknowledges everything first sent in `set`; otherwise
    /// only the delta retransmitted under that resend id. Unknown
    /// acknowledgments are ignored.
    ///
    /// Set-wide acks match the set a delta was first sent in, which
    /// retransmissions keep. Set numbers wrap after 256 frames, so a stale
    /// set-wide ack arriving that late can retire a delta whose
    /// retransmission was lost.
    pub fn acknowledge(&mut self, set: u8, resend: u8, now_ms: u64) -> usize {
        let matched: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.state.set() == Some(set)
                    && (resend == 0 || entry.state.resend().map(NonZeroU8::get) == Some(resend))
            })
            .map(|(&seq, _)| seq)
            .collect();

        let mut sampled = false;
        for &seq in &matched {
            if let Some(entry) = self.remove(seq) {
                if let (false, DeltaState::Unacked { sent_at, .. }) = (sampled, entry.state) {
                    self.timer
                        .record(&self.config, now_ms.saturating_sub(sent_at));
                    sampled = true;
                }
            }
        }
        if matched.is_empty() {
            trace!(set, resend, "acknowledgment matched nothing");
        }
        matched.len()
    }

    /// Drops everything and starts over with a first frame.
    pub fn reset_for_map_change(&mut self) {
        debug!(dropped = self.entries.len(), "resetting pool for map change");
        self.entries.clear();
        self.pending.clear();
        self.by_key.clear();
        self.queue.clear();
        self.held_resends = [false; 256];
        self.next_set = 0;
        self.next_resend = 1;
        self.is_first = true;
    }

    fn remove(&mut self, seq: u64) -> Option<PoolEntry> {
        let entry = self.entries.remove(&seq)?;
        let key = entry.delta.key();
        if self.pending.get(&key) == Some(&seq) {
            self.pending.remove(&key);
        }
        if let Some(seqs) = self.by_key.get_mut(&key) {
            seqs.retain(|&other| other != seq);
            if seqs.is_empty() {
                self.by_key.remove(&key);
            }
        }
        if let Some(resend) = entry.state.resend() {
            self.held_resends[usize::from(resend.get())] = false;
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use model::{MobjDelta, MobjFlags, PlayerDelta, SectorDelta, SoundDelta, SoundEmitter};

    use super::*;

    fn mobj(id: u32, health: i32) -> Delta {
        Delta::mobj(id, MobjDelta::new().with_health(health))
    }

    fn send_all(pool: &mut DeltaPool, now: u64) -> u8 {
        pool.rate(now);
        let set = pool.next_set();
        while let Some(handle) = pool.extract_next() {
            assert!(pool.commit(handle, set, now));
        }
        set
    }

    #[test]
    fn new_pool_is_first_and_empty() {
        let pool = DeltaPool::default();
        assert!(pool.is_first());
        assert!(pool.is_empty());
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn empty_delta_is_ignored() {
        let mut pool = DeltaPool::default();
        assert!(pool.insert_or_merge(Delta::mobj(1u32, MobjDelta::new()), 0).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn new_deltas_merge() {
        let mut pool = DeltaPool::default();
        let first = pool.insert_or_merge(mobj(1, 10), 0);
        let second = pool.insert_or_merge(
            Delta::mobj(1u32, MobjDelta::new().with_angle(0x4000_0000)),
            5,
        );
        assert_eq!(first, second);
        assert_eq!(pool.pending_count(), 1);

        let entry = pool.pending_for(mobj(1, 0).key()).unwrap();
        let model::DeltaBody::Mobj(merged) = &entry.delta().body else {
            panic!("expected mobj");
        };
        assert!(merged.flags.contains(MobjFlags::HEALTH | MobjFlags::ANGLE));
        assert_eq!(entry.created_at(), 0);
    }

    #[test]
    fn sent_delta_gets_a_separate_successor() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        pool.insert_or_merge(mobj(1, 10), 0);
        send_all(&mut pool, 0);
        pool.insert_or_merge(
            Delta::mobj(1u32, MobjDelta::new().with_angle(1)),
            1,
        );
        assert_eq!(pool.pending_count(), 2);
        assert_eq!(pool.unacked_count(), 1);
        assert_eq!(pool.queued_count(), 1);
    }

    #[test]
    fn newer_fields_are_subtracted_from_in_flight() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        pool.insert_or_merge(mobj(1, 10), 0);
        send_all(&mut pool, 0);

        // Same field again: the in-flight copy has nothing left to resend.
        pool.insert_or_merge(mobj(1, 20), 1);
        assert_eq!(pool.unacked_count(), 0);
        assert_eq!(pool.pending_count(), 1);
    }

    #[test]
    fn null_mobj_drops_in_flight_and_replaces_pending() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        pool.insert_or_merge(mobj(1, 10), 0);
        send_all(&mut pool, 0);
        pool.insert_or_merge(Delta::mobj(1u32, MobjDelta::new().with_angle(1)), 1);

        pool.insert_or_merge(Delta::null_mobj(1u32), 2);
        assert_eq!(pool.pending_count(), 1);
        assert!(pool.pending_for(mobj(1, 0).key()).unwrap().delta().is_null());
    }

    #[test]
    fn extract_does_not_change_state() {
        let mut pool = DeltaPool::default();
        let handle = pool.insert_or_merge(mobj(1, 1), 0).unwrap();
        pool.rate(0);
        assert_eq!(pool.extract_next(), Some(handle));
        assert_eq!(pool.get(handle).unwrap().state(), DeltaState::New);
        assert_eq!(pool.extract_next(), None);
    }

    #[test]
    fn acknowledge_set_retires_frame() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        pool.insert_or_merge(mobj(1, 1), 0);
        pool.insert_or_merge(mobj(2, 1), 0);
        let set = send_all(&mut pool, 0);

        assert_eq!(pool.acknowledge(set, 0, 30), 2);
        assert!(pool.is_empty());
        assert_eq!(pool.ack_timer().samples(), 1);
        assert_eq!(pool.acknowledge(set, 0, 40), 0);
    }

    #[test]
    fn timed_out_delta_is_resent_with_tag() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        let handle = pool.insert_or_merge(mobj(1, 1), 0).unwrap();
        let set = send_all(&mut pool, 0);

        pool.rate(99);
        assert_eq!(pool.extract_next(), None);

        pool.rate(100);
        assert_eq!(pool.extract_next(), Some(handle));
        let tag = pool.get(handle).unwrap().resend_tag().unwrap();
        assert_eq!(tag.set, set);
        assert_eq!(tag.resend.get(), 1);
        assert_eq!(pool.get(handle).unwrap().priority(), PriorityClass::Resend);

        let next = pool.next_set();
        pool.commit(handle, next, 100);
        assert_eq!(pool.acknowledge(set, 2, 150), 0);
        assert_eq!(pool.acknowledge(set, 1, 150), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn resend_ids_are_unique_and_nonzero() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        for id in 0..300u32 {
            pool.insert_or_merge(mobj(id, 1), 0);
        }
        send_all(&mut pool, 0);
        pool.rate(100);

        let mut seen = std::collections::HashSet::new();
        let mut tagged = 0;
        for entry in pool.iter() {
            if let Some(tag) = entry.resend_tag() {
                assert!(seen.insert(tag.resend.get()));
                tagged += 1;
            }
        }
        assert_eq!(tagged, 255);
        assert_eq!(pool.unacked_count(), 300);
    }

    #[test]
    fn sounds_are_not_resent() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        pool.insert_or_merge(
            Delta::sound(3u32, SoundDelta::new(SoundEmitter::Mobj, 9, 1.0)),
            0,
        );
        send_all(&mut pool, 0);
        pool.rate(500);
        assert!(pool.is_empty());
    }

    #[test]
    fn rate_orders_by_class_then_age() {
        let mut pool = DeltaPool::default();
        let sound = pool
            .insert_or_merge(
                Delta::sound(0u32, SoundDelta::new(SoundEmitter::World, 4, 1.0)),
                0,
            )
            .unwrap();
        let sector = pool
            .insert_or_merge(Delta::sector(2u32, SectorDelta::new().with_light(0.5)), 1)
            .unwrap();
        let old_mobj = pool.insert_or_merge(mobj(5, 1), 2).unwrap();
        let new_mobj = pool.insert_or_merge(mobj(6, 1), 3).unwrap();
        let player = pool
            .insert_or_merge(Delta::player(0u32, PlayerDelta::new().with_mobj(5)), 4)
            .unwrap();

        pool.rate(10);
        let order: Vec<_> = std::iter::from_fn(|| pool.extract_next()).collect();
        assert_eq!(order, vec![player, old_mobj, new_mobj, sector, sound]);
    }

    #[test]
    fn map_change_resets_everything() {
        let mut pool = DeltaPool::new(PoolConfig::for_testing());
        pool.insert_or_merge(mobj(1, 1), 0);
        send_all(&mut pool, 0);
        pool.clear_first();
        pool.next_set();

        pool.reset_for_map_change();
        assert!(pool.is_empty());
        assert!(pool.is_first());
        assert_eq!(pool.next_set(), 0);
    }
}

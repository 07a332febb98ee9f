use model::{Delta, MobjDelta, PlayerDelta, SectorDelta};
use pool::{DeltaPool, DeltaState, PoolConfig};

fn mobj(id: u32) -> Delta {
    Delta::mobj(id, MobjDelta::new().with_health(100))
}

fn send_frame(pool: &mut DeltaPool, now: u64) -> (u8, usize) {
    pool.rate(now);
    let set = pool.next_set();
    let mut written = 0;
    while let Some(handle) = pool.extract_next() {
        pool.commit(handle, set, now);
        written += 1;
    }
    pool.clear_first();
    (set, written)
}

#[test]
fn map_change_discards_new_and_unacked() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    pool.insert_or_merge(mobj(1), 0);
    pool.insert_or_merge(mobj(2), 0);
    send_frame(&mut pool, 0);

    pool.insert_or_merge(mobj(3), 1);
    pool.insert_or_merge(Delta::player(0u32, PlayerDelta::new().with_mobj(3)), 1);
    pool.insert_or_merge(Delta::sector(7u32, SectorDelta::new().with_light(1.0)), 1);
    assert_eq!(pool.pending_count(), 5);
    assert_eq!(pool.unacked_count(), 2);
    assert!(!pool.is_first());

    pool.reset_for_map_change();
    assert_eq!(pool.pending_count(), 0);
    assert!(pool.is_first());
}

#[test]
fn acknowledging_twice_is_a_no_op() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    pool.insert_or_merge(mobj(1), 0);
    pool.insert_or_merge(mobj(2), 0);
    let (set, _) = send_frame(&mut pool, 0);
    pool.insert_or_merge(mobj(3), 5);

    assert_eq!(pool.acknowledge(set, 0, 10), 2);
    let after_first = pool.iter().cloned().collect::<Vec<_>>();
    assert_eq!(pool.acknowledge(set, 0, 11), 0);
    assert_eq!(pool.iter().cloned().collect::<Vec<_>>(), after_first);
}

#[test]
fn unknown_acknowledgments_are_ignored() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    pool.insert_or_merge(mobj(1), 0);
    send_frame(&mut pool, 0);
    assert_eq!(pool.acknowledge(200, 0, 1), 0);
    assert_eq!(pool.acknowledge(0, 77, 1), 0);
    assert_eq!(pool.unacked_count(), 1);
}

#[test]
fn lost_frame_is_resent_until_acknowledged() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    let handle = pool.insert_or_merge(mobj(1), 0).unwrap();
    let (first_set, _) = send_frame(&mut pool, 0);

    // The frame was lost; the timeout moves the delta back into the queue.
    let (_, written) = send_frame(&mut pool, 100);
    assert_eq!(written, 1);
    let state = pool.get(handle).unwrap().state();
    assert_eq!(state.set(), Some(first_set));
    let resend = state.resend().unwrap();

    // Lost again: the same resend id is reused.
    send_frame(&mut pool, 200);
    assert_eq!(pool.get(handle).unwrap().state().resend(), Some(resend));

    assert_eq!(pool.acknowledge(first_set, resend.get(), 210), 1);
    assert!(pool.is_empty());
}

#[test]
fn late_set_ack_retires_a_resent_delta() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    let handle = pool.insert_or_merge(mobj(1), 0).unwrap();
    let (set, _) = send_frame(&mut pool, 0);
    pool.rate(100);
    assert!(matches!(
        pool.get(handle).unwrap().state(),
        DeltaState::Resend { .. }
    ));

    assert_eq!(pool.acknowledge(set, 0, 120), 1);
    assert!(pool.extract_next().is_none());
}

#[test]
fn resend_id_is_released_on_ack() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    pool.insert_or_merge(mobj(1), 0);
    let (set, _) = send_frame(&mut pool, 0);
    send_frame(&mut pool, 100);
    let first_id = pool.iter().next().unwrap().state().resend().unwrap();
    pool.acknowledge(set, first_id.get(), 110);

    pool.insert_or_merge(mobj(2), 120);
    send_frame(&mut pool, 120);
    send_frame(&mut pool, 220);
    let second_id = pool.iter().next().unwrap().state().resend().unwrap();
    assert_ne!(second_id.get(), 0);
}

#[test]
fn set_ack_after_wraparound_matches_the_first_transmission() {
    let mut pool = DeltaPool::new(PoolConfig::for_testing());
    let handle = pool.insert_or_merge(mobj(1), 0).unwrap();
    let (set, _) = send_frame(&mut pool, 0);
    let (resend_set, written) = send_frame(&mut pool, 100);
    assert_eq!(written, 1);
    assert_ne!(resend_set, set);

    let mut reused = pool.next_set();
    while reused != set {
        reused = pool.next_set();
    }
    assert_eq!(pool.get(handle).unwrap().state().set(), Some(set));
    assert_eq!(pool.acknowledge(reused, 0, 150), 1);
    assert!(pool.is_empty());
}

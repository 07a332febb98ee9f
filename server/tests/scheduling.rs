mod common;

use common::{small_mobj, ManualClock, MockTransport, ScriptedWorld};
use server::{ClientId, FrameServer, ServerConfig};
use wire::{Channel, FrameKind};

const CLIENT: ClientId = ClientId(1);

fn server_with(interval: u64, clients: &[ClientId]) -> FrameServer {
    let config = ServerConfig {
        frame_interval: interval,
        ..ServerConfig::for_testing()
    };
    let mut server = FrameServer::new(config).unwrap();
    for &client in clients {
        server.on_client_joined(client);
        server.set_ready(client, true).unwrap();
        server.set_in_game(client, true).unwrap();
    }
    server
}

#[test]
fn interval_two_skips_the_odd_tick() {
    let mut server = server_with(2, &[CLIENT]);
    let mut world = ScriptedWorld::default();
    let mut transport = MockTransport::default();

    let clock = ManualClock::at(10);
    assert_eq!(server.tick(&mut world, &mut transport, &clock).frames.len(), 1);
    assert_eq!(server.session(CLIENT).unwrap().last_transmit(), Some(10));

    clock.set(11);
    assert!(server.tick(&mut world, &mut transport, &clock).frames.is_empty());

    clock.set(12);
    assert_eq!(server.tick(&mut world, &mut transport, &clock).frames.len(), 1);
    assert_eq!(server.session(CLIENT).unwrap().last_transmit(), Some(12));
    assert_eq!(transport.sent.len(), 2);
}

#[test]
fn repeated_tick_is_ignored() {
    let mut server = server_with(1, &[CLIENT]);
    let mut world = ScriptedWorld::default();
    let mut transport = MockTransport::default();
    let clock = ManualClock::at(3);

    assert!(server.tick(&mut world, &mut transport, &clock).processed);
    let again = server.tick(&mut world, &mut transport, &clock);
    assert!(!again.processed);
    assert!(again.frames.is_empty());
    assert_eq!(world.pulled.len(), 1);
}

#[test]
fn clients_are_staggered() {
    let clients = [ClientId(1), ClientId(2)];
    let mut server = server_with(2, &clients);
    let mut world = ScriptedWorld::default();
    let mut transport = MockTransport::default();
    let clock = ManualClock::default();

    for tick in 0..10 {
        clock.set(tick);
        server.tick(&mut world, &mut transport, &clock);
    }

    // Both are served on the first tick, then they alternate.
    assert_eq!(transport.frames_for(ClientId(1)).len(), 5);
    assert_eq!(transport.frames_for(ClientId(2)).len(), 6);
    let order: Vec<u32> = transport.sent.iter().skip(2).map(|(to, _, _)| to.0).collect();
    assert_eq!(order, vec![2, 1, 2, 1, 2, 1, 2, 1, 2]);
}

#[test]
fn unready_client_is_skipped() {
    let mut server = server_with(1, &[CLIENT]);
    server.on_client_joined(ClientId(2));
    let mut world = ScriptedWorld::default();
    let mut transport = MockTransport::default();

    server.tick(&mut world, &mut transport, &ManualClock::at(1));
    assert_eq!(transport.frames_for(ClientId(2)).len(), 0);
    assert_eq!(transport.frames_for(CLIENT).len(), 1);
}

#[test]
fn single_player_without_recorder_sends_nothing() {
    let mut server = server_with(1, &[CLIENT]);
    server.set_net_game(false);
    let mut world = ScriptedWorld::default();
    let mut transport = MockTransport::default();

    let report = server.tick(&mut world, &mut transport, &ManualClock::at(1));
    assert!(!report.processed);
    assert!(transport.sent.is_empty());

    server.set_recording(CLIENT, true).unwrap();
    server.tick(&mut world, &mut transport, &ManualClock::at(2));
    assert_eq!(transport.sent.len(), 1);
}

#[test]
fn backpressure_skips_without_losing_deltas() {
    let mut server = server_with(1, &[CLIENT]);
    let mut world = ScriptedWorld::default();
    world.changes.insert(1, vec![small_mobj(5)]);
    let mut transport = MockTransport {
        blocked: vec![CLIENT],
        ..MockTransport::default()
    };

    server.tick(&mut world, &mut transport, &ManualClock::at(1));
    assert!(transport.sent.is_empty());
    let session = server.session(CLIENT).unwrap();
    assert_eq!(session.pool().queued_count(), 1);
    assert!(session.pool().is_first());
    assert_eq!(session.stats().backpressure_skips, 1);

    transport.blocked.clear();
    server.tick(&mut world, &mut transport, &ManualClock::at(2));
    assert_eq!(transport.sent.len(), 1);
    assert_eq!(transport.sent[0].2, Channel::Ordered);
}

#[test]
fn map_change_restarts_with_first_frame_and_baseline() {
    let mut server = server_with(1, &[CLIENT]);
    let mut world = ScriptedWorld {
        live: vec![small_mobj(1), small_mobj(2)],
        ..ScriptedWorld::default()
    };
    let mut transport = MockTransport::default();
    let clock = ManualClock::at(1);

    let first = server.tick(&mut world, &mut transport, &clock);
    assert_eq!(first.frames[0].1.stats().unwrap().kind, FrameKind::First);
    assert_eq!(first.frames[0].1.stats().unwrap().deltas, 2);

    clock.set(2);
    let regular = server.tick(&mut world, &mut transport, &clock);
    assert_eq!(regular.frames[0].1.stats().unwrap().kind, FrameKind::Regular);

    server.on_map_changed();
    assert_eq!(server.session(CLIENT).unwrap().pool().pending_count(), 0);

    clock.set(3);
    let after = server.tick(&mut world, &mut transport, &clock);
    let stats = after.frames[0].1.stats().unwrap();
    assert_eq!(stats.kind, FrameKind::First);
    assert_eq!(stats.set, 0);
    assert_eq!(stats.deltas, 2);
}

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};

use model::{Delta, MobjDelta, ZPosition};
use server::{BandwidthRating, ClientId, Clock, Transport, WorldSnapshot};
use wire::Channel;

/// Records every frame instead of sending it.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub sent: Vec<(ClientId, Vec<u8>, Channel)>,
    pub blocked: Vec<ClientId>,
    pub ratings: BTreeMap<ClientId, BandwidthRating>,
}

impl MockTransport {
    pub fn frames_for(&self, client: ClientId) -> Vec<&[u8]> {
        self.sent
            .iter()
            .filter(|(to, _, _)| *to == client)
            .map(|(_, bytes, _)| bytes.as_slice())
            .collect()
    }
}

impl Transport for MockTransport {
    fn can_send_now(&mut self, client: ClientId) -> bool {
        !self.blocked.contains(&client)
    }

    fn send(&mut self, client: ClientId, frame: Vec<u8>, channel: Channel) {
        self.sent.push((client, frame, channel));
    }

    fn bandwidth_rating(&self, client: ClientId) -> BandwidthRating {
        self.ratings.get(&client).copied().unwrap_or(BandwidthRating::MIN)
    }
}

/// Clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    pub tick: Cell<u64>,
    pub ms: Cell<u64>,
}

impl ManualClock {
    pub fn at(tick: u64) -> Self {
        let clock = Self::default();
        clock.set(tick);
        clock
    }

    /// Moves to `tick`, one tic being 28 ms.
    pub fn set(&self, tick: u64) {
        self.tick.set(tick);
        self.ms.set(tick * 28);
    }
}

impl Clock for ManualClock {
    fn current_tick(&self) -> u64 {
        self.tick.get()
    }

    fn now_ms(&self) -> u64 {
        self.ms.get()
    }
}

/// World whose changes are scripted per tick.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    pub changes: BTreeMap<u64, Vec<Delta>>,
    pub live: Vec<Delta>,
    pub pulled: VecDeque<u64>,
}

impl WorldSnapshot for ScriptedWorld {
    fn for_each_changed_entity(&mut self, tick: u64, visit: &mut dyn FnMut(Delta)) {
        self.pulled.push_back(tick);
        for delta in self.changes.remove(&tick).unwrap_or_default() {
            visit(delta);
        }
    }

    fn for_each_live_entity(&mut self, visit: &mut dyn FnMut(Delta)) {
        for delta in &self.live {
            visit(delta.clone());
        }
    }
}

/// A mobj delta with every field set, well over 32 bytes on the wire.
pub fn big_mobj(id: u32) -> Delta {
    Delta::mobj(
        id,
        MobjDelta::new()
            .with_origin(1024.5, -2048.25, ZPosition::Literal(64.0))
            .with_momentum([200.0, -3.0, 1.0])
            .with_angle(0x8000_0000)
            .with_selector(0x0100_0203)
            .with_state(Some(0x0012_3456))
            .with_render_flags(0xDEAD_BEEF)
            .with_size(20.0, 56.0)
            .with_health(-100_000)
            .with_floor_clip(3.0)
            .with_translucency(128)
            .with_fade_target(Some(7))
            .with_type(300),
    )
}

pub fn small_mobj(id: u32) -> Delta {
    Delta::mobj(id, MobjDelta::new().with_health(1))
}
